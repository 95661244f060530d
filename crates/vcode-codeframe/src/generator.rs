//! Codeframe generation: sample, prompt, complete, validate.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;
use vcode_core::{Codeframe, CodeframeStatus, QuestionGroup, RawTable};
use vcode_llm::{CompletionOptions, CompletionService};

use crate::coverage::estimate_sample_coverage;
use crate::error::CodeframeError;
use crate::extract::{extract_responses, response_texts};
use crate::parse::parse_codeframe;
use crate::prompts::PromptRegistry;
use crate::sampler::sample_with;

/// Sampling and completion settings for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub sample_percentage: f64,
    pub minimum_floor: usize,
    pub completion: CompletionOptions,
    /// Fixes the sample for reproducible runs. `None` draws a fresh sample each call.
    pub seed: Option<u64>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            sample_percentage: 30.0,
            minimum_floor: 20,
            completion: CompletionOptions {
                temperature: Some(0.3),
                max_tokens: Some(4000),
                json_mode: true,
            },
            seed: None,
        }
    }
}

/// Builds a generated [`Codeframe`] for one question group per call.
///
/// Holds no per-call state, so one generator can serve concurrent calls for
/// different groups. It never retries; a failed call is re-invoked by the
/// caller, drawing a fresh sample.
pub struct CodeframeGenerator<'a> {
    service: &'a dyn CompletionService,
    prompts: PromptRegistry,
    options: GenerationOptions,
}

impl<'a> CodeframeGenerator<'a> {
    #[must_use]
    pub fn new(service: &'a dyn CompletionService, options: GenerationOptions) -> Self {
        Self::with_prompts(service, PromptRegistry::default(), options)
    }

    #[must_use]
    pub fn with_prompts(
        service: &'a dyn CompletionService,
        prompts: PromptRegistry,
        options: GenerationOptions,
    ) -> Self {
        Self {
            service,
            prompts,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Extract `group`'s responses from `table` and generate its codeframe.
    ///
    /// # Errors
    ///
    /// See [`CodeframeGenerator::generate`].
    pub async fn generate_from_table(
        &self,
        table: &RawTable,
        group: &QuestionGroup,
    ) -> Result<Codeframe, CodeframeError> {
        let responses = response_texts(&extract_responses(table, group));
        self.generate(group, &responses).await
    }

    /// Generate a codeframe for `group` from its responses.
    ///
    /// 1. Drop blank responses; fail if nothing is left.
    /// 2. Sample, then render the question type's prompt.
    /// 3. Call the completion service once.
    /// 4. Validate the returned JSON and estimate per-code coverage on the sample.
    ///
    /// # Errors
    ///
    /// - [`CodeframeError::EmptyInput`] when there are no non-blank responses
    ///   (the service is not called).
    /// - [`CodeframeError::UnknownQuestionType`] when no template is registered.
    /// - [`CodeframeError::GenerationService`] when the service call fails.
    /// - [`CodeframeError::MalformedCodeframe`] when the output fails validation.
    pub async fn generate(
        &self,
        group: &QuestionGroup,
        responses: &[String],
    ) -> Result<Codeframe, CodeframeError> {
        let cleaned: Vec<String> = responses
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();

        if cleaned.is_empty() {
            return Err(CodeframeError::EmptyInput {
                group_id: group.group_id.clone(),
            });
        }

        let sampled = self.draw_sample(&cleaned);
        let prompt = self.prompts.build(&group.question_type, &sampled)?;
        let run_id = Uuid::new_v4();

        tracing::info!(
            %run_id,
            group_id = %group.group_id,
            question_type = %group.question_type,
            sample_size = sampled.len(),
            total_responses = cleaned.len(),
            "requesting codeframe"
        );

        let text = self
            .service
            .complete(&prompt.system, &prompt.user, &self.options.completion)
            .await
            .map_err(|e| {
                tracing::warn!(%run_id, group_id = %group.group_id, error = %e, "completion failed");
                CodeframeError::GenerationService(e)
            })?;

        let mut entries = parse_codeframe(&text, &group.question_type).inspect_err(|e| {
            tracing::warn!(%run_id, group_id = %group.group_id, error = %e, "rejected model output");
        })?;
        estimate_sample_coverage(&mut entries, &sampled);

        tracing::info!(
            %run_id,
            group_id = %group.group_id,
            codes = entries.len(),
            "codeframe generated"
        );

        Ok(Codeframe {
            run_id,
            group_id: group.group_id.clone(),
            group_name: group.group_name.clone(),
            question_type: group.question_type.clone(),
            column_indices: group.column_indices.clone(),
            entries,
            sample_size: sampled.len(),
            total_responses: cleaned.len(),
            generated_at: Utc::now(),
            status: CodeframeStatus::Generated,
            finalized_at: None,
        })
    }

    /// Sampling finishes before the first await so no RNG is held across it.
    fn draw_sample(&self, cleaned: &[String]) -> Vec<String> {
        let GenerationOptions {
            sample_percentage,
            minimum_floor,
            seed,
            ..
        } = self.options;
        match seed {
            Some(seed) => sample_with(
                cleaned,
                sample_percentage,
                minimum_floor,
                &mut StdRng::seed_from_u64(seed),
            ),
            None => sample_with(cleaned, sample_percentage, minimum_floor, &mut rand::rng()),
        }
    }
}

#[cfg(test)]
#[path = "generator_test.rs"]
mod tests;
