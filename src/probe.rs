//! Invocation context probe.
//!
//! Rust has no portable way to ask "who called me" at runtime, so the call
//! context is recorded explicitly. Host collaborators (router, console
//! kernel, event dispatcher, job construction) push a [`CallFrame`] onto a
//! thread-local stack before they ask the container for an instance, and the
//! [`FrameGuard`] pops it when the call returns. A [`ContextProbe`] captures
//! that stack innermost-first, bounded to a depth.
//!
//! Frames are snapshots: the caller object is shared, never owned by the
//! probe, and the captured vector is dropped once matching completes.

use std::any::{type_name, Any};
use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

thread_local! {
    static FRAMES: RefCell<Vec<CallFrame>> = const { RefCell::new(Vec::new()) };
}

/// Object a frame was executing on.
#[derive(Clone)]
pub struct CallerRef {
    type_name: &'static str,
    object: Arc<dyn Any + Send + Sync>,
}

impl CallerRef {
    pub fn new<T: Any + Send + Sync>(object: Arc<T>) -> Self {
        Self {
            type_name: type_name::<T>(),
            object,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }
}

impl fmt::Debug for CallerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// One entry of the captured call context.
#[derive(Debug, Clone)]
pub struct CallFrame {
    caller: Option<CallerRef>,
    class: Option<&'static str>,
    function: Cow<'static, str>,
    is_static: bool,
}

impl CallFrame {
    /// A method call on `caller`.
    pub fn method<T: Any + Send + Sync>(caller: Arc<T>, function: impl Into<Cow<'static, str>>) -> Self {
        Self {
            class: Some(type_name::<T>()),
            caller: Some(CallerRef::new(caller)),
            function: function.into(),
            is_static: false,
        }
    }

    /// A static call on type `T`; no object context.
    pub fn static_call<T: ?Sized + 'static>(function: impl Into<Cow<'static, str>>) -> Self {
        Self {
            caller: None,
            class: Some(type_name::<T>()),
            function: function.into(),
            is_static: true,
        }
    }

    /// A free function or closure call; no object and no class.
    pub fn function(function: impl Into<Cow<'static, str>>) -> Self {
        Self {
            caller: None,
            class: None,
            function: function.into(),
            is_static: false,
        }
    }

    pub fn caller(&self) -> Option<&CallerRef> {
        self.caller.as_ref()
    }

    /// Downcast the caller object.
    pub fn caller_as<T: Any>(&self) -> Option<&T> {
        self.caller.as_ref()?.downcast::<T>()
    }

    pub fn class(&self) -> Option<&'static str> {
        self.class
    }

    pub fn function_name(&self) -> &str {
        &self.function
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// True when this is a method call named `function` on an object of type `T`.
    pub fn matches<T: Any>(&self, function: &str) -> bool {
        self.function == function && self.caller_as::<T>().is_some()
    }

    /// True when this is a static call named `function`.
    pub fn matches_static(&self, function: &str) -> bool {
        self.is_static && self.function == function
    }
}

/// Source of call context snapshots.
pub trait ContextProbe: Send + Sync {
    /// Capture at most `limit` frames, innermost first.
    fn capture(&self, limit: usize) -> Vec<CallFrame>;
}

/// Pops its frame off the thread-local stack when dropped.
#[must_use = "the frame is popped as soon as the guard is dropped"]
pub struct FrameGuard {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        FRAMES.with(|frames| frames.borrow_mut().truncate(self.depth));
    }
}

/// Push `frame` onto the current thread's call context.
pub fn enter(frame: CallFrame) -> FrameGuard {
    let depth = FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        let depth = frames.len();
        frames.push(frame);
        depth
    });
    FrameGuard {
        depth,
        _not_send: PhantomData,
    }
}

/// Run `f` with `frame` pushed.
pub fn within<R>(frame: CallFrame, f: impl FnOnce() -> R) -> R {
    let _guard = enter(frame);
    f()
}

/// Number of frames recorded on the current thread.
pub fn depth() -> usize {
    FRAMES.with(|frames| frames.borrow().len())
}

/// Probe over the thread-local frame stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadStackProbe;

impl ContextProbe for ThreadStackProbe {
    fn capture(&self, limit: usize) -> Vec<CallFrame> {
        FRAMES.with(|frames| frames.borrow().iter().rev().take(limit).cloned().collect())
    }
}

/// Probe that always returns the same frames. The first frame is innermost.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    frames: Vec<CallFrame>,
}

impl StaticProbe {
    pub fn new(frames: Vec<CallFrame>) -> Self {
        Self { frames }
    }
}

impl ContextProbe for StaticProbe {
    fn capture(&self, limit: usize) -> Vec<CallFrame> {
        self.frames.iter().take(limit).cloned().collect()
    }
}
