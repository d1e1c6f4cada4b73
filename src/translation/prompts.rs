/*!
 * Prompt construction for batch subtitle translation.
 *
 * A request consists of:
 * - a system prompt with the translation rules, the established term
 *   translations and the response format
 * - a user prompt with the cues of one batch, each tagged `<<ENTRY_n>>`
 *   where `n` is the cue index
 *
 * The matching response grammar lives in [`crate::translation::response`].
 */

use crate::providers::CompletionRequest;
use crate::subtitle_processor::SubtitleEntry;
use crate::translation::context::ContextMemory;

/// Opening tag of one translated cue; followed by the cue index and `>>`
pub const ENTRY_MARKER_PREFIX: &str = "<<ENTRY_";

/// Opening tag of the term section
pub const TERMS_MARKER: &str = "<<TERMS>>";

/// Final tag of a complete response
pub const END_MARKER: &str = "<<END>>";

/// Tag line for one cue
pub fn entry_marker(seq_num: usize) -> String {
    format!("{}{}>>", ENTRY_MARKER_PREFIX, seq_num)
}

/// System prompt template for subtitle translation.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// The default rules for natural-sounding subtitle translation.
    pub const SUBTITLE_TRANSLATOR: &'static str = r#"Transform movie subtitles into {target_language} that sounds like locals naturally speaking.

ESSENTIAL RULES:
1. Use everyday speech patterns - how people really talk
2. Match the speaker's personality (casual/formal/young/old)
3. Keep names and places consistent throughout
4. Sound natural when spoken aloud
5. Use colloquial expressions native speakers actually use

AVOID: Textbook language, overly formal phrases, awkward literal translations

Make it sound so natural that {target_language} speakers would think it was originally written in their language.

BATCH PROCESSING RULES:
- Maintain dialogue flow and consistency across all subtitles
- Keep character personalities consistent throughout the batch
- Preserve context and relationships between consecutive subtitles
- The source text is in {source_language}"#;

    /// Response format the parser expects.
    pub const FORMAT_REQUIREMENTS: &'static str = r#"FORMAT REQUIREMENTS:
- For every input subtitle, write its tag line exactly as given (for example <<ENTRY_7>>) followed by the translation on the next line(s)
- Keep every tag, never merge, split or renumber subtitles
- Keep line breaks inside a subtitle where they make sense
- After the last subtitle write <<TERMS>> and list every name, place or other proper noun you translated, one per line as: source => translation | category
- category is one of: name, place, other_proper_noun
- Finish with <<END>> on its own line
- Return nothing else: no explanations, no notes"#;

    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    pub fn subtitle_translator() -> Self {
        Self::new(Self::SUBTITLE_TRANSLATOR)
    }

    /// Render the template with the given languages.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::subtitle_translator()
    }
}

/// Builder for the prompts of one batch.
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder {
    template: PromptTemplate,
    source_language: String,
    target_language: String,
    established_terms: String,
    entries: Vec<(usize, String)>,
    term_hints: Vec<String>,
}

impl TranslationPromptBuilder {
    /// Create a builder; an empty or `auto` source language lets the model detect it
    pub fn new(source_language: &str, target_language: &str) -> Self {
        let source_language = match source_language.trim() {
            "" => "the original language".to_string(),
            s if s.eq_ignore_ascii_case("auto") => "the original language".to_string(),
            s => s.to_string(),
        };

        Self {
            template: PromptTemplate::default(),
            source_language,
            target_language: target_language.trim().to_string(),
            established_terms: String::new(),
            entries: Vec::new(),
            term_hints: Vec::new(),
        }
    }

    /// Inject the established term translations
    pub fn with_memory(mut self, memory: &ContextMemory) -> Self {
        self.established_terms = memory.render_for_prompt();
        self
    }

    /// Cues to translate, tagged by their index
    pub fn with_entries(mut self, entries: &[SubtitleEntry]) -> Self {
        self.entries = entries.iter().map(|e| (e.seq_num, e.text())).collect();
        self
    }

    /// Likely proper nouns the model should report in the term section
    pub fn with_term_hints(mut self, hints: Vec<String>) -> Self {
        self.term_hints = hints;
        self
    }

    pub fn build_system_prompt(&self) -> String {
        let mut prompt = self.template.render(&self.source_language, &self.target_language);

        if !self.established_terms.is_empty() {
            prompt.push_str("\n\nESTABLISHED TRANSLATIONS (use these exact translations):\n");
            prompt.push_str(&self.established_terms);
        }

        prompt.push_str("\n\n");
        prompt.push_str(PromptTemplate::FORMAT_REQUIREMENTS);
        prompt
    }

    pub fn build_user_prompt(&self) -> String {
        let mut prompt = format!(
            "Translate these consecutive movie subtitles to {}, maintaining consistency with previously established terms:\n\n",
            self.target_language
        );

        for (seq_num, text) in &self.entries {
            prompt.push_str(&entry_marker(*seq_num));
            prompt.push('\n');
            prompt.push_str(text);
            prompt.push('\n');
        }

        if !self.term_hints.is_empty() {
            prompt.push_str("\nPossible proper nouns in this part: ");
            prompt.push_str(&self.term_hints.join(", "));
            prompt.push('\n');
        }

        prompt
    }

    /// Build (system, user) prompts
    pub fn build(&self) -> (String, String) {
        (self.build_system_prompt(), self.build_user_prompt())
    }

    /// Build a complete provider request
    pub fn build_request(&self, model: &str, temperature: Option<f32>, max_tokens: u32) -> CompletionRequest {
        let (system, user) = self.build();
        CompletionRequest::new(model, system, user)
            .temperature(temperature)
            .max_tokens(max_tokens)
    }
}
