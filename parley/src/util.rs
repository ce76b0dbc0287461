//! Small helpers for building inputs and reading replies.

use crate::{ChatResponse, Part};

/// One text part per item, in order.
pub fn text_parts<I, S>(texts: I) -> Vec<Part>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    texts.into_iter().map(Part::text).collect()
}

/// The first text segment of a reply, if it carried any text.
pub fn first_result(response: &impl ChatResponse) -> Option<String> {
    response.results().into_iter().next()
}

/// Every text segment of a reply joined with newlines.
pub fn joined_results(response: &impl ChatResponse) -> String {
    response.results().join("\n")
}
