//! Container that splits a token budget across ordered children.

use async_trait::async_trait;
use prompt_primitives::Message;
use prompt_tokenizers::Tokenizer;
use tracing::{debug, trace};

use crate::allocation::AllocationPlan;
use crate::error::RenderResult;
use crate::rendered::RenderedSection;
use crate::section::{PromptSection, RenderScope};
use crate::shape::join_text;
use crate::sizing::Sizing;

/// Renders ordered children within a shared budget.
///
/// Required children render first and optional children after them, each
/// group in declaration order. Every child renders against a sub-budget
/// derived from an [`AllocationPlan`] and from what the children rendered
/// before it actually used. Required children are always kept and may push
/// the container over budget; optional children are dropped whole when they
/// do not fit. Kept output is assembled in declaration order.
pub struct LayoutEngine {
    sections: Vec<Box<dyn PromptSection>>,
    sizing: Sizing,
    required: bool,
    separator: String,
}

impl LayoutEngine {
    /// Creates a layout over `sections` with automatic sizing, the required
    /// flag set, and a newline separator.
    #[must_use]
    pub fn new(sections: Vec<Box<dyn PromptSection>>) -> Self {
        Self {
            sections,
            sizing: Sizing::Auto,
            required: true,
            separator: "\n".to_owned(),
        }
    }

    /// Appends a child section.
    #[must_use]
    pub fn with_section(mut self, section: impl PromptSection + 'static) -> Self {
        self.sections.push(Box::new(section));
        self
    }

    /// Sets the sizing policy the parent applies to this layout.
    #[must_use]
    pub fn with_sizing(mut self, sizing: Sizing) -> Self {
        self.sizing = sizing;
        self
    }

    /// Sets whether the layout must always appear in its parent.
    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the text-mode separator.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Returns the child sections.
    #[must_use]
    pub fn sections(&self) -> &[Box<dyn PromptSection>] {
        &self.sections
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("sections", &self.sections.len())
            .field("sizing", &self.sizing)
            .field("required", &self.required)
            .field("separator", &self.separator)
            .finish()
    }
}

#[async_trait]
impl PromptSection for LayoutEngine {
    fn sizing(&self) -> Sizing {
        self.sizing
    }

    fn required(&self) -> bool {
        self.required
    }

    fn separator(&self) -> &str {
        &self.separator
    }

    async fn render_as_text(
        &self,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<String>> {
        layout(
            &self.sections,
            &self.separator,
            &TextProjection,
            scope,
            self.sizing.cap(max_tokens),
        )
        .await
    }

    async fn render_as_messages(
        &self,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<Vec<Message>>> {
        layout(
            &self.sections,
            &self.separator,
            &MessageProjection,
            scope,
            self.sizing.cap(max_tokens),
        )
        .await
    }
}

/// Lays out `sections` as text joined by `separator`.
pub(crate) async fn layout_text(
    sections: &[Box<dyn PromptSection>],
    separator: &str,
    scope: RenderScope<'_>,
    max_tokens: usize,
) -> RenderResult<RenderedSection<String>> {
    layout(sections, separator, &TextProjection, scope, max_tokens).await
}

async fn layout<P: Projection>(
    sections: &[Box<dyn PromptSection>],
    separator: &str,
    projection: &P,
    scope: RenderScope<'_>,
    max_tokens: usize,
) -> RenderResult<RenderedSection<P::Output>> {
    let policies: Vec<_> = sections
        .iter()
        .map(|section| (section.sizing(), section.required()))
        .collect();
    let plan = AllocationPlan::new(&policies, max_tokens);
    let separator_cost = to_signed(projection.separator_cost(separator, scope.tokenizer));

    let mut remaining = to_signed(max_tokens);
    let mut slots: Vec<Option<RenderedSection<P::Output>>> = Vec::with_capacity(sections.len());
    slots.resize_with(sections.len(), || None);
    let mut kept_count = 0usize;
    let mut required_overflow = false;

    for index in plan.render_order() {
        let section = &sections[index];
        let join_cost = if kept_count == 0 { 0 } else { separator_cost };
        let required = section.required();
        let budget = plan.budget_for(index, remaining - join_cost);
        trace!(index, budget, remaining, required, "rendering section");

        let rendered = projection.render(section.as_ref(), scope, budget).await?;
        if P::is_empty(&rendered.output) {
            trace!(index, "section rendered nothing");
            continue;
        }
        let cost = to_signed(rendered.length) + join_cost;

        if required {
            if rendered.too_long {
                debug!(index, length = rendered.length, budget, "required section overflowed");
                required_overflow = true;
            }
        } else if rendered.too_long || remaining <= 0 || cost > remaining {
            debug!(
                index,
                length = rendered.length,
                budget,
                remaining,
                "optional section dropped"
            );
            continue;
        }
        remaining -= cost;
        kept_count += 1;
        slots[index] = Some(rendered);
    }

    let kept = slots.into_iter().flatten().collect();
    let mut assembled = projection.assemble(kept, separator, scope.tokenizer, max_tokens);
    assembled.too_long |= required_overflow;
    Ok(assembled)
}

/// One of the two output shapes a layout can assemble.
#[async_trait]
trait Projection: Send + Sync {
    type Output: Send;

    async fn render(
        &self,
        section: &dyn PromptSection,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<Self::Output>>;

    fn is_empty(output: &Self::Output) -> bool;

    fn separator_cost(&self, separator: &str, tokenizer: &dyn Tokenizer) -> usize;

    fn assemble(
        &self,
        parts: Vec<RenderedSection<Self::Output>>,
        separator: &str,
        tokenizer: &dyn Tokenizer,
        max_tokens: usize,
    ) -> RenderedSection<Self::Output>;
}

struct TextProjection;

#[async_trait]
impl Projection for TextProjection {
    type Output = String;

    async fn render(
        &self,
        section: &dyn PromptSection,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<String>> {
        section.render_as_text(scope, max_tokens).await
    }

    fn is_empty(output: &String) -> bool {
        output.is_empty()
    }

    fn separator_cost(&self, separator: &str, tokenizer: &dyn Tokenizer) -> usize {
        tokenizer.count(separator)
    }

    fn assemble(
        &self,
        parts: Vec<RenderedSection<String>>,
        separator: &str,
        tokenizer: &dyn Tokenizer,
        max_tokens: usize,
    ) -> RenderedSection<String> {
        // Re-measured: BPE counts are not additive across joins.
        let output = join_text("", parts.iter().map(|part| part.output.as_str()), separator);
        let length = tokenizer.count(&output);
        RenderedSection::new(output, length, max_tokens)
    }
}

struct MessageProjection;

#[async_trait]
impl Projection for MessageProjection {
    type Output = Vec<Message>;

    async fn render(
        &self,
        section: &dyn PromptSection,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<Vec<Message>>> {
        section.render_as_messages(scope, max_tokens).await
    }

    fn is_empty(output: &Vec<Message>) -> bool {
        output.is_empty()
    }

    fn separator_cost(&self, _separator: &str, _tokenizer: &dyn Tokenizer) -> usize {
        0
    }

    fn assemble(
        &self,
        parts: Vec<RenderedSection<Vec<Message>>>,
        _separator: &str,
        _tokenizer: &dyn Tokenizer,
        max_tokens: usize,
    ) -> RenderedSection<Vec<Message>> {
        let length = parts.iter().map(|part| part.length).sum();
        let output = parts.into_iter().flat_map(|part| part.output).collect();
        RenderedSection::new(output, length, max_tokens)
    }
}

fn to_signed(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template_section::TemplateSection;
    use crate::test_support::Fixture;
    use crate::text_section::TextSection;
    use prompt_primitives::MessageRole;
    use crate::error::RenderError;
    use prompt_templates::TemplateError;
    use prompt_tokenizers::Tokenizer;

    fn text(content: &str) -> TextSection {
        TextSection::new(content, MessageRole::System)
    }

    fn optional(content: &str) -> TextSection {
        text(content).with_required(false)
    }

    #[tokio::test]
    async fn empty_layout_renders_nothing() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default();

        let rendered = layout.render_as_text(fixture.scope(), 10).await.unwrap();
        assert_eq!(rendered, RenderedSection::new(String::new(), 0, 10));
        let rendered = layout.render_as_messages(fixture.scope(), 10).await.unwrap();
        assert!(rendered.output.is_empty());
        assert!(!rendered.too_long);
    }

    #[tokio::test]
    async fn required_children_are_never_dropped() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default()
            .with_section(text("aaaa"))
            .with_section(text("bbbb"));

        let rendered = layout.render_as_text(fixture.scope(), 5).await.unwrap();
        assert_eq!(rendered.output, "aaaa\nbbbb");
        assert_eq!(rendered.length, 9);
        assert!(rendered.too_long);

        let rendered = layout.render_as_messages(fixture.scope(), 5).await.unwrap();
        assert_eq!(rendered.output.len(), 2);
        assert_eq!(rendered.length, 8);
        assert!(rendered.too_long);
    }

    #[tokio::test]
    async fn optional_child_that_does_not_fit_is_omitted() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default()
            .with_section(text("hello"))
            .with_section(optional("world!!"));

        let rendered = layout.render_as_text(fixture.scope(), 8).await.unwrap();
        assert_eq!(rendered.output, "hello");
        assert_eq!(rendered.length, 5);
        assert!(!rendered.too_long);

        let rendered = layout.render_as_messages(fixture.scope(), 8).await.unwrap();
        assert_eq!(rendered.output, vec![Message::system("hello")]);
        assert_eq!(rendered.length, 5);
        assert!(!rendered.too_long);
    }

    #[tokio::test]
    async fn optional_child_is_kept_when_it_fits() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default()
            .with_section(text("hello"))
            .with_section(optional("world"));

        let rendered = layout.render_as_text(fixture.scope(), 11).await.unwrap();
        assert_eq!(rendered.output, "hello\nworld");
        assert!(!rendered.too_long);

        // The separator is charged in text mode only.
        let rendered = layout.render_as_text(fixture.scope(), 10).await.unwrap();
        assert_eq!(rendered.output, "hello");
        let rendered = layout.render_as_messages(fixture.scope(), 10).await.unwrap();
        assert_eq!(rendered.output.len(), 2);
    }

    #[tokio::test]
    async fn empty_children_add_no_separator() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default()
            .with_section(text("a"))
            .with_section(optional(""))
            .with_section(text("b"));

        let rendered = layout.render_as_text(fixture.scope(), 10).await.unwrap();
        assert_eq!(rendered.output, "a\nb");
        assert_eq!(rendered.length, 3);
    }

    #[tokio::test]
    async fn output_keeps_declaration_order() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default()
            .with_section(optional("one"))
            .with_section(text("two"))
            .with_section(optional("three"))
            .with_section(text("four"));

        let rendered = layout.render_as_text(fixture.scope(), 100).await.unwrap();
        assert_eq!(rendered.output, "one\ntwo\nthree\nfour");
    }

    #[tokio::test]
    async fn proportional_child_is_limited_to_its_share() {
        let fixture = Fixture::new();
        let long = "x".repeat(60);
        let short = "y".repeat(40);

        let layout = LayoutEngine::default()
            .with_section(optional(&long).with_sizing(Sizing::Proportional(0.5)));
        let rendered = layout.render_as_text(fixture.scope(), 100).await.unwrap();
        assert_eq!(rendered.output, "");
        assert_eq!(rendered.length, 0);

        let layout = LayoutEngine::default()
            .with_section(optional(&short).with_sizing(Sizing::Proportional(0.5)));
        let rendered = layout.render_as_text(fixture.scope(), 100).await.unwrap();
        assert_eq!(rendered.output, short);
    }

    #[tokio::test]
    async fn slack_from_reserved_children_flows_to_later_automatic_children() {
        let fixture = Fixture::new();
        let filler = "z".repeat(90);
        let layout = LayoutEngine::default()
            .with_separator("")
            .with_section(text("abc").with_sizing(Sizing::Fixed(50)))
            .with_section(optional(&filler));

        let rendered = layout.render_as_text(fixture.scope(), 100).await.unwrap();
        assert_eq!(rendered.length, 93);
        assert!(rendered.output.ends_with(&filler));
    }

    #[tokio::test]
    async fn automatic_children_leave_room_for_later_reservations() {
        let fixture = Fixture::new();
        let filler = "z".repeat(60);
        let layout = LayoutEngine::default()
            .with_separator("")
            .with_section(optional(&filler))
            .with_section(optional("abc").with_sizing(Sizing::Fixed(50)));

        let rendered = layout.render_as_text(fixture.scope(), 100).await.unwrap();
        assert_eq!(rendered.output, "abc");
    }

    #[tokio::test]
    async fn later_required_child_outranks_earlier_optional_child() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default()
            .with_section(optional("aaaa"))
            .with_section(text("bbbbbbbb"));

        let rendered = layout.render_as_text(fixture.scope(), 8).await.unwrap();
        assert_eq!(rendered.output, "bbbbbbbb");
        assert_eq!(rendered.length, 8);
        assert!(!rendered.too_long);

        let rendered = layout.render_as_messages(fixture.scope(), 8).await.unwrap();
        assert_eq!(rendered.output, vec![Message::system("bbbbbbbb")]);
        assert_eq!(rendered.length, 8);
        assert!(!rendered.too_long);
    }

    #[tokio::test]
    async fn earlier_optional_child_keeps_its_place_when_it_fits() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default()
            .with_section(optional("aaaa"))
            .with_section(text("bbbbbbbb"));

        let rendered = layout.render_as_text(fixture.scope(), 13).await.unwrap();
        assert_eq!(rendered.output, "aaaa\nbbbbbbbb");
        assert_eq!(rendered.length, 13);
        assert!(!rendered.too_long);

        let rendered = layout.render_as_messages(fixture.scope(), 12).await.unwrap();
        assert_eq!(
            rendered.output,
            vec![Message::system("aaaa"), Message::system("bbbbbbbb")]
        );
        assert!(!rendered.too_long);
    }

    #[tokio::test]
    async fn optional_automatic_child_leaves_room_for_later_required_automatic_child() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default()
            .with_separator("")
            .with_section(optional(&"a".repeat(30)))
            .with_section(text(&"b".repeat(80)));

        let rendered = layout.render_as_messages(fixture.scope(), 100).await.unwrap();
        assert_eq!(rendered.output, vec![Message::system("b".repeat(80))]);
        assert!(!rendered.too_long);

        let rendered = layout.render_as_messages(fixture.scope(), 110).await.unwrap();
        assert_eq!(rendered.output.len(), 2);
        assert_eq!(rendered.length, 110);
    }

    #[tokio::test]
    async fn fixed_layout_caps_its_own_budget() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default()
            .with_sizing(Sizing::Fixed(10))
            .with_section(text("hello"))
            .with_section(optional("world!!"));

        let rendered = layout.render_as_text(fixture.scope(), 100).await.unwrap();
        assert_eq!(rendered.output, "hello");
        assert!(!rendered.too_long);

        let rendered = layout.render_as_messages(fixture.scope(), 100).await.unwrap();
        assert_eq!(rendered.output, vec![Message::system("hello")]);
        assert!(!rendered.too_long);
    }

    #[tokio::test]
    async fn optional_automatic_children_split_the_remainder() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default()
            .with_separator("")
            .with_section(optional(&"a".repeat(60)))
            .with_section(optional(&"b".repeat(10)));

        let rendered = layout.render_as_messages(fixture.scope(), 100).await.unwrap();
        assert_eq!(rendered.output, vec![Message::system("b".repeat(10))]);
    }

    #[tokio::test]
    async fn required_child_overflow_marks_container_too_long() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default()
            .with_section(text(&"q".repeat(20)).with_sizing(Sizing::Proportional(0.1)));

        let rendered = layout.render_as_text(fixture.scope(), 100).await.unwrap();
        assert_eq!(rendered.length, 20);
        assert!(rendered.too_long);
    }

    #[tokio::test]
    async fn optional_child_after_overflow_is_dropped() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default()
            .with_section(text("0123456789"))
            .with_section(optional("x"));

        let rendered = layout.render_as_messages(fixture.scope(), 4).await.unwrap();
        assert_eq!(rendered.output, vec![Message::system("0123456789")]);
        assert_eq!(rendered.length, 10);
        assert!(rendered.too_long);
    }

    #[tokio::test]
    async fn nested_optional_layout_is_dropped_whole() {
        let fixture = Fixture::new();
        let nested = LayoutEngine::default()
            .with_required(false)
            .with_section(text("inner-one"))
            .with_section(text("inner-two"));
        let layout = LayoutEngine::default()
            .with_section(text("outer"))
            .with_section(nested);

        let rendered = layout.render_as_text(fixture.scope(), 12).await.unwrap();
        assert_eq!(rendered.output, "outer");
        assert!(!rendered.too_long);

        let rendered = layout.render_as_text(fixture.scope(), 100).await.unwrap();
        assert_eq!(rendered.output, "outer\ninner-one\ninner-two");
    }

    #[tokio::test]
    async fn lengths_match_a_fresh_measurement() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default()
            .with_section(TemplateSection::system("You are terse."))
            .with_section(TemplateSection::user("Hello World"))
            .with_section(TemplateSection::assistant("Hi.").with_required(false));

        let text = layout.render_as_text(fixture.scope(), 40).await.unwrap();
        assert_eq!(text.length, fixture.tokenizer.count(&text.output));

        let messages = layout.render_as_messages(fixture.scope(), 40).await.unwrap();
        let measured: usize = messages
            .output
            .iter()
            .map(|message| fixture.tokenizer.count(message.content()))
            .sum();
        assert_eq!(messages.length, measured);
    }

    #[tokio::test]
    async fn rendering_is_repeatable() {
        let fixture = Fixture::new();
        let layout = LayoutEngine::default()
            .with_section(text("alpha"))
            .with_section(optional("beta"))
            .with_section(optional("gamma").with_sizing(Sizing::Fixed(3)));

        let first = layout.render_as_text(fixture.scope(), 12).await.unwrap();
        let second = layout.render_as_text(fixture.scope(), 12).await.unwrap();
        assert_eq!(first, second);

        let first = layout.render_as_messages(fixture.scope(), 12).await.unwrap();
        let second = layout.render_as_messages(fixture.scope(), 12).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn required_resolution_failure_propagates() {
        let fixture = Fixture::strict();
        let layout = LayoutEngine::default()
            .with_section(text("fine"))
            .with_section(TemplateSection::user("{{missing}}"));

        let err = layout
            .render_as_text(fixture.scope(), 100)
            .await
            .expect_err("required failure");
        assert!(matches!(err, RenderError::TemplateResolution { .. }));
    }

    #[tokio::test]
    async fn optional_resolution_failure_also_propagates() {
        let fixture = Fixture::strict();
        let layout = LayoutEngine::default()
            .with_section(text("fine"))
            .with_section(TemplateSection::user("{{missing}}").with_required(false));

        let err = layout
            .render_as_messages(fixture.scope(), 100)
            .await
            .expect_err("optional failure is not treated as overflow");
        assert!(matches!(
            err,
            RenderError::TemplateResolution {
                source: TemplateError::MissingVariable { .. },
                ..
            }
        ));
    }
}
