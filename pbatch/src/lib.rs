//! Batch prompting: split a list of inputs into prompts and run them
//! concurrently through one chat client, keeping the caller's order.
//!
//! ```rust
//! use pbatch::{Example, Prompt};
//!
//! let prompt = Prompt::new("Translate each line to French.")
//!     .with_example(Example::new(["cat"], "chat"))
//!     .with_input_chunk(2);
//!
//! let prompts = prompt.prompts(&["dog", "bird", "fish"], "%d. ");
//! assert_eq!(prompts.len(), 2);
//! assert!(prompts[1].contains("3. fish"));
//! ```

mod error;
mod execute;
mod prompt;

pub use error::{BatchError, BatchErrorKind};
pub use execute::BatchResult;
pub use prompt::{DEFAULT_TIMEOUT, Example, Prompt, PromptParts, Template};

pub mod prelude {
    pub use crate::{BatchError, BatchErrorKind, BatchResult, Example, Prompt, Template};
}
