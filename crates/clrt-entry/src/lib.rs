//! Entry-boundary contract shared by every OpenCL entry point.
//!
//! Each exported function runs the same protocol before any device work:
//! - attach the calling thread ([`thread::ensure_attached`], [`entry_gate!`])
//! - answer `clGet*Info` queries through [`info::get_info`]
//! - resolve dependency lists through [`wait_list::set_event_wait_list`]
//! - store optional results through [`output::OptionalOutput`]

pub mod abi;
pub mod error;
pub mod handle;
pub mod info;
pub mod logging;
pub mod output;
pub mod policy;
pub mod properties;
pub mod thread;
pub mod wait_list;

pub use error::{status, EntryError, EntryResult};
pub use handle::HandleTable;
pub use info::{FieldDescriptor, FieldKind, InfoField};
pub use output::OptionalOutput;
pub use policy::{policy, Policy};
pub use properties::{check_context_properties, ContextProperties};
pub use thread::{ensure_attached, HostThread};
pub use wait_list::{ContextBound, EventLookup, WaitList};
