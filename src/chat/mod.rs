pub use clock::{Clock, SystemClock};
pub use message::{ChatMessage, Sender};
pub use store::MessageStore;

#[cfg(test)]
pub use clock::ManualClock;

mod clock;
mod message;
mod store;
