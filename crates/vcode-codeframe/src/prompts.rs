//! Question-type prompt templates for codeframe generation.

use std::collections::HashMap;

use vcode_core::QuestionType;

use crate::error::CodeframeError;

/// Output contract appended to every codeframe system prompt.
const CODEFRAME_JSON_CONTRACT: &str = "\
Respond with JSON only, no prose and no markdown fences, in exactly this shape:
{
  \"codeframe\": [
    {
      \"code\": \"C001\",
      \"label\": \"short label\",
      \"definition\": \"one sentence describing what belongs in this code\",
      \"examples\": [\"verbatim example\", \"verbatim example\"]
    }
  ]
}

Rules:
- Every code must be unique. Use C001, C002, ... in order of frequency.
- Labels are short (1-4 words) and mutually exclusive where possible.
- Examples are copied verbatim from the responses provided.
- Do not add catch-all codes such as Other, None or Don't know; they are added later.";

const UNAIDED_AWARENESS_SYSTEM: &str = "\
You are an expert survey coder building a codeframe for an unaided brand awareness \
question. Respondents typed the brands they could think of without prompting.

Create one code per distinct brand. Fold misspellings, abbreviations and nicknames into \
the brand they refer to (\"coke\", \"coca cola\" and \"cocacola\" are one brand). Keep \
sub-brands separate when respondents clearly distinguish them (for example \"Diet Coke\" \
versus \"Coca-Cola\"). Use the brand's proper name as the label.";

const BRAND_DESCRIPTIONS_SYSTEM: &str = "\
You are an expert survey coder building a codeframe for a question where respondents \
describe a brand in their own words.

Create codes for the recurring themes, attributes and associations (taste, price, \
quality, image, health, packaging and so on). Split positive and negative sentiment \
about the same attribute into separate codes. Merge themes mentioned by very few \
respondents into the closest broader code.";

const MISCELLANEOUS_SYSTEM: &str = "\
You are an expert survey coder building a codeframe for an open-ended survey question.

Identify the distinct themes in the responses and create one code per theme. Prefer \
between 8 and 25 codes. Each code should be specific enough to be useful in a report \
and broad enough that several respondents fall into it.";

/// System prompt for one question type. The JSON contract is appended at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub system: String,
}

impl PromptTemplate {
    #[must_use]
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
        }
    }
}

/// Rendered prompt pair ready for the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptInstance {
    pub template_key: String,
    pub system: String,
    pub user: String,
}

/// Mapping from question type to template. Extend with [`PromptRegistry::register`].
#[derive(Debug, Clone)]
pub struct PromptRegistry {
    templates: HashMap<QuestionType, PromptTemplate>,
}

impl Default for PromptRegistry {
    fn default() -> Self {
        let mut templates = HashMap::new();
        templates.insert(
            QuestionType::UnaidedAwareness,
            PromptTemplate::new(UNAIDED_AWARENESS_SYSTEM),
        );
        templates.insert(
            QuestionType::BrandDescriptions,
            PromptTemplate::new(BRAND_DESCRIPTIONS_SYSTEM),
        );
        templates.insert(
            QuestionType::Miscellaneous,
            PromptTemplate::new(MISCELLANEOUS_SYSTEM),
        );
        Self { templates }
    }
}

impl PromptRegistry {
    /// Add or replace the template for a question type.
    pub fn register(&mut self, question_type: QuestionType, template: PromptTemplate) {
        self.templates.insert(question_type, template);
    }

    #[must_use]
    pub fn contains(&self, question_type: &QuestionType) -> bool {
        self.templates.contains_key(question_type)
    }

    /// Render the system and user prompts for a sample.
    ///
    /// # Errors
    ///
    /// Returns [`CodeframeError::UnknownQuestionType`] if no template is
    /// registered for `question_type`.
    pub fn build(
        &self,
        question_type: &QuestionType,
        sampled: &[String],
    ) -> Result<PromptInstance, CodeframeError> {
        let template = self
            .templates
            .get(question_type)
            .ok_or_else(|| CodeframeError::UnknownQuestionType(question_type.to_string()))?;

        let system = format!("{}\n\n{CODEFRAME_JSON_CONTRACT}", template.system);
        let user = format!(
            "Here are {} survey responses:\n\n{}",
            sampled.len(),
            sampled.join("\n")
        );

        Ok(PromptInstance {
            template_key: question_type.to_string(),
            system,
            user,
        })
    }
}
