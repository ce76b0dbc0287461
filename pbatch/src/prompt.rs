use std::fmt::{Debug, Display, Formatter, Write};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

const INDEX_PLACEHOLDER: &str = "%d";

/// A worked example shown to the model ahead of the real input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Example {
    pub input: Vec<String>,
    pub output: String,
    pub prefix: String,
}

impl Example {
    pub fn new<I, S>(input: I, output: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: input.into_iter().map(Into::into).collect(),
            output: output.into(),
            prefix: String::new(),
        }
    }

    /// Line prefix for multi-line example input; `%d` becomes the 1-based line number.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}

impl Display for Example {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.input.as_slice() {
            [] => Ok(()),
            [single] => write!(f, "Input: {single}\nOutput: {}", self.output),
            many => write!(
                f,
                "Input:\"\"\"\n{}\"\"\"\nOutput: {}",
                render_lines(many, &self.prefix, 0),
                self.output
            ),
        }
    }
}

/// What a [`Template`] sees for one chunk of input.
#[derive(Debug, Clone, Copy)]
pub struct PromptParts<'a> {
    pub request: &'a str,
    pub example: Option<&'a Example>,
    pub input: &'a [&'a str],
    pub prefix: &'a str,
    /// Position of `input[0]` in the whole batch, counted from zero.
    pub start: usize,
}

impl PromptParts<'_> {
    /// The input lines, each prefixed and newline-terminated.
    pub fn input_lines(&self) -> String {
        render_lines(self.input, self.prefix, self.start)
    }
}

type RenderFn = dyn Fn(&PromptParts<'_>) -> String + Send + Sync;

/// Turns one chunk of input into prompt text.
///
/// ```rust
/// use pbatch::{Prompt, Template};
///
/// let prompt = Prompt::new("Summarize").with_template(Template::new(|parts| {
///     format!("{}:\n{}", parts.request, parts.input_lines())
/// }));
///
/// assert_eq!(prompt.prompts(&["a", "b"], "- "), vec!["Summarize:\n- a\n- b\n"]);
/// ```
#[derive(Clone)]
pub struct Template(Arc<RenderFn>);

impl Template {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&PromptParts<'_>) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(render))
    }

    pub fn render(&self, parts: &PromptParts<'_>) -> String {
        (self.0)(parts)
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::new(default_template)
    }
}

impl Debug for Template {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Template(..)")
    }
}

fn default_template(parts: &PromptParts<'_>) -> String {
    let mut out = parts.request.to_string();
    if let Some(example) = parts.example {
        let _ = write!(out, "\n###\nExample:\n{example}\n###");
    }
    if !parts.input.is_empty() {
        let _ = write!(out, "\nInput:\"\"\"\n{}\"\"\"", parts.input_lines());
    }
    out.push_str("\nOutput:");
    out
}

/// Builds batch prompts from a fixed request plus chunks of input lines.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub(crate) request: String,
    pub(crate) example: Option<Example>,
    pub(crate) template: Template,
    pub(crate) chunk: usize,
    pub(crate) timeout: Duration,
}

impl Prompt {
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            example: None,
            template: Template::default(),
            chunk: 0,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_example(mut self, example: Example) -> Self {
        self.example = Some(example);
        self
    }

    /// Replaces the built-in request/example/input layout.
    pub fn with_template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    /// Inputs per prompt. `0` puts every input in a single prompt.
    pub fn with_input_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk;
        self
    }

    /// Per-call timeout. `Duration::ZERO` disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// One rendered prompt per chunk of inputs. `prefix` is put before every
    /// input line, with `%d` replaced by the input's 1-based position in `input`.
    pub fn prompts<S: AsRef<str>>(&self, input: &[S], prefix: &str) -> Vec<String> {
        if input.is_empty() {
            return Vec::new();
        }

        let chunk = if self.chunk == 0 { input.len() } else { self.chunk };
        input
            .chunks(chunk)
            .enumerate()
            .map(|(position, lines)| self.render(lines, prefix, position * chunk))
            .collect()
    }

    fn render<S: AsRef<str>>(&self, lines: &[S], prefix: &str, start: usize) -> String {
        let input = lines.iter().map(AsRef::as_ref).collect::<Vec<_>>();
        self.template.render(&PromptParts {
            request: &self.request,
            example: self.example.as_ref(),
            input: &input,
            prefix,
            start,
        })
    }
}

fn render_lines<S: AsRef<str>>(lines: &[S], prefix: &str, start: usize) -> String {
    let mut out = String::new();
    for (offset, line) in lines.iter().enumerate() {
        if prefix.contains(INDEX_PLACEHOLDER) {
            let number = (start + offset + 1).to_string();
            out.push_str(&prefix.replace(INDEX_PLACEHOLDER, &number));
        } else {
            out.push_str(prefix);
        }
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{DEFAULT_TIMEOUT, Example, Prompt, Template};

    #[test]
    fn example_renders_by_input_count() {
        assert_eq!(Example::new(Vec::<String>::new(), "result").to_string(), "");
        assert_eq!(
            Example::new(["abc"], "result").with_prefix("%d|").to_string(),
            "Input: abc\nOutput: result"
        );
        assert_eq!(
            Example::new(["abc", "def", "ghi"], "result").to_string(),
            "Input:\"\"\"\nabc\ndef\nghi\n\"\"\"\nOutput: result"
        );
        assert_eq!(
            Example::new(["abc", "def", "ghi"], "result")
                .with_prefix("%d|")
                .to_string(),
            "Input:\"\"\"\n1|abc\n2|def\n3|ghi\n\"\"\"\nOutput: result"
        );
    }

    #[test]
    fn single_prompt_without_example() {
        let prompts = Prompt::new("Classify").prompts(&["test"], "");
        assert_eq!(prompts, vec!["Classify\nInput:\"\"\"\ntest\n\"\"\"\nOutput:".to_string()]);
    }

    #[test]
    fn example_block_precedes_input() {
        let prompts = Prompt::new("Classify")
            .with_example(Example::new(["abc", "def"], "example"))
            .prompts(&["test"], "");

        assert_eq!(
            prompts[0],
            "Classify\n###\nExample:\nInput:\"\"\"\nabc\ndef\n\"\"\"\nOutput: example\n###\n\
             Input:\"\"\"\ntest\n\"\"\"\nOutput:"
        );
    }

    #[test]
    fn chunks_keep_global_line_numbers() {
        let prompts = Prompt::new("Go")
            .with_input_chunk(2)
            .prompts(&["a", "b", "c", "d", "e"], "%d. ");

        assert_eq!(prompts.len(), 3);
        assert_eq!(prompts[0], "Go\nInput:\"\"\"\n1. a\n2. b\n\"\"\"\nOutput:");
        assert_eq!(prompts[1], "Go\nInput:\"\"\"\n3. c\n4. d\n\"\"\"\nOutput:");
        assert_eq!(prompts[2], "Go\nInput:\"\"\"\n5. e\n\"\"\"\nOutput:");
    }

    #[test]
    fn prefix_without_placeholder_is_literal() {
        let prompts = Prompt::new("Go").prompts(&["a", "b"], "- ");
        assert_eq!(prompts[0], "Go\nInput:\"\"\"\n- a\n- b\n\"\"\"\nOutput:");
    }

    #[test]
    fn custom_template_sees_every_chunk() {
        let prompts = Prompt::new("Rate")
            .with_example(Example::new(["x"], "5"))
            .with_input_chunk(2)
            .with_template(Template::new(|parts| {
                let example = parts.example.map(ToString::to_string).unwrap_or_default();
                format!(
                    "{} [{}] from {}\n{}",
                    parts.request,
                    example,
                    parts.start,
                    parts.input_lines()
                )
            }))
            .prompts(&["a", "b", "c"], "%d) ");

        assert_eq!(
            prompts,
            vec![
                "Rate [Input: x\nOutput: 5] from 0\n1) a\n2) b\n".to_string(),
                "Rate [Input: x\nOutput: 5] from 2\n3) c\n".to_string(),
            ]
        );
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert!(Prompt::new("Go").prompts::<&str>(&[], "").is_empty());
    }

    #[test]
    fn timeout_defaults_to_three_minutes() {
        assert_eq!(Prompt::new("Go").timeout(), DEFAULT_TIMEOUT);
        assert_eq!(
            Prompt::new("Go").with_timeout(Duration::from_secs(5)).timeout(),
            Duration::from_secs(5)
        );
    }
}
