/// Builds one text [`Content`](crate::Content) turn from a role shorthand.
///
/// ```rust
/// use parley::{ROLE_ASSISTANT, turn};
///
/// let content = turn!(assistant => "Done.");
/// assert_eq!(content.role, ROLE_ASSISTANT);
/// assert_eq!(content.text(), "Done.");
/// ```
#[macro_export]
macro_rules! turn {
    (user => $text:expr $(,)?) => {
        $crate::Content::user(vec![$crate::Part::text($text)])
    };
    (assistant => $text:expr $(,)?) => {
        $crate::Content::assistant(vec![$crate::Part::text($text)])
    };
    ($role:ident => $text:expr $(,)?) => {
        compile_error!("unsupported role: use user or assistant");
    };
}

/// Builds a `Vec<Content>` history, e.g. for [`Session::with_history`](crate::Session::with_history).
///
/// ```rust
/// use parley::{ROLE_USER, turns};
///
/// let history = turns![
///     user => "Hi",
///     assistant => "Hello!",
/// ];
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history[0].role, ROLE_USER);
/// ```
#[macro_export]
macro_rules! turns {
    () => {
        Vec::<$crate::Content>::new()
    };
    ($($role:ident => $text:expr),+ $(,)?) => {
        vec![$($crate::turn!($role => $text)),+]
    };
}

/// Builds a `Vec<Part>` from text and any other [`Part`](crate::Part) values.
///
/// ```rust
/// use parley::{Blob, Part, parts};
///
/// let parts = parts!["Describe this file", Part::Blob(Blob::new("text/plain", b"hi".to_vec()))];
/// assert_eq!(parts.len(), 2);
/// assert_eq!(parts[0].as_text(), Some("Describe this file"));
/// ```
#[macro_export]
macro_rules! parts {
    () => {
        Vec::<$crate::Part>::new()
    };
    ($($part:expr),+ $(,)?) => {
        vec![$($crate::Part::from($part)),+]
    };
}
