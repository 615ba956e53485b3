//! Host environment collaborators.
//!
//! Thin stand-ins for the router, console kernel and event dispatcher the
//! role engine plugs into. Each one records a [`CallFrame`] naming itself
//! before it asks the container for an instance; that frame is what the
//! [`patterns`](crate::patterns) recognize.
//!
//! [`CallFrame`]: crate::probe::CallFrame

pub mod console;
pub mod events;
pub mod router;

pub use console::{CommandInput, CommandResolution, ConsoleKernel};
pub use events::{Event, EventDispatcher, ListenerResolution};
pub use router::{Method, Request, Route, RouteCollection, RouteDispatch, RouteDispatcher, Router};
