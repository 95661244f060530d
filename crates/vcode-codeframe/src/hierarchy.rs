//! Brand parent/child/alias roll-up over codeframes and coded responses.
//!
//! One [`BrandHierarchyManager`] holds the active configuration for a
//! project. Reads (`process_codeframe`, `roll_up_responses`, suggestions,
//! summaries) take `&self`; `add_hierarchy` and `import_config` take
//! `&mut self`, so concurrent writers need external synchronization.

use std::collections::{HashMap, HashSet};

use vcode_core::{
    brand_code, BrandFamily, BrandHierarchy, BrandRollupConfig, Codeframe, CodeframeEntry,
    CodedResponse, RollupFile, BRAND_AWARENESS_CATEGORY,
};

use crate::catch_all::next_free_numeric;

/// First parent numeric; each later hierarchy starts [`PARENT_NUMERIC_STEP`] higher.
const PARENT_NUMERIC_BASE: u32 = 1000;
const PARENT_NUMERIC_STEP: u32 = 100;
/// Sub-brand numerics start this far above their parent.
const CHILD_NUMERIC_OFFSET: u32 = 10;
/// Aliases number upward from here, clear of real category numerics.
const ALIAS_NUMERIC_BASE: u32 = 9000;

/// Built-in brand families used by [`BrandHierarchyManager::suggest_hierarchies`]
/// when the roll-up file supplies none.
const SEED_FAMILIES: &[(&str, &[&str])] = &[
    (
        "The Coca-Cola Company",
        &[
            "Coca-Cola",
            "Coke",
            "Sprite",
            "Fanta",
            "Dasani",
            "Minute Maid",
            "Powerade",
            "Smartwater",
        ],
    ),
    (
        "PepsiCo",
        &[
            "Pepsi",
            "Mountain Dew",
            "Gatorade",
            "Tropicana",
            "Aquafina",
            "Doritos",
            "Quaker",
        ],
    ),
    (
        "Keurig Dr Pepper",
        &["Dr Pepper", "7up", "Canada Dry", "Snapple", "Sunkist"],
    ),
    (
        "Nestle",
        &["Nescafe", "KitKat", "Perrier", "San Pellegrino", "Nespresso"],
    ),
    (
        "Anheuser-Busch InBev",
        &["Budweiser", "Bud Light", "Stella Artois", "Corona", "Michelob"],
    ),
    (
        "Procter & Gamble",
        &["Tide", "Pampers", "Gillette", "Oral-B", "Charmin"],
    ),
    ("Unilever", &["Dove", "Lipton", "Hellmann", "Ben & Jerry"]),
];

/// The built-in reference families as owned values.
#[must_use]
pub fn seed_families() -> Vec<BrandFamily> {
    SEED_FAMILIES
        .iter()
        .map(|(parent, members)| BrandFamily {
            parent: (*parent).to_string(),
            members: members.iter().map(|m| (*m).to_string()).collect(),
        })
        .collect()
}

/// Hands out numeric ids, skipping any already taken.
struct NumericAllocator {
    taken: HashSet<u32>,
    next_alias: u32,
}

impl NumericAllocator {
    fn new(taken: HashSet<u32>) -> Self {
        Self {
            taken,
            next_alias: ALIAS_NUMERIC_BASE,
        }
    }

    /// `preferred`, or the next free id above it.
    fn claim(&mut self, preferred: u32) -> u32 {
        let numeric = next_free_numeric(&self.taken, preferred);
        self.taken.insert(numeric);
        numeric
    }

    fn claim_alias(&mut self) -> u32 {
        let numeric = self.claim(self.next_alias);
        self.next_alias = numeric.saturating_add(1);
        numeric
    }
}

#[derive(Debug, Clone)]
pub struct BrandHierarchyManager {
    config: BrandRollupConfig,
    reference_families: Vec<BrandFamily>,
}

impl BrandHierarchyManager {
    /// Manager over `config`, suggesting from the built-in families.
    #[must_use]
    pub fn new(config: BrandRollupConfig) -> Self {
        Self::with_reference_families(config, seed_families())
    }

    #[must_use]
    pub fn with_reference_families(
        config: BrandRollupConfig,
        reference_families: Vec<BrandFamily>,
    ) -> Self {
        Self {
            config,
            reference_families,
        }
    }

    /// Manager for a loaded roll-up file. An empty `reference_families` list
    /// falls back to the built-in families.
    #[must_use]
    pub fn from_rollup_file(file: RollupFile) -> Self {
        if file.reference_families.is_empty() {
            Self::new(file.config)
        } else {
            Self::with_reference_families(file.config, file.reference_families)
        }
    }

    #[must_use]
    pub fn config(&self) -> &BrandRollupConfig {
        &self.config
    }

    #[must_use]
    pub fn reference_families(&self) -> &[BrandFamily] {
        &self.reference_families
    }

    /// Append a hierarchy. Overlap with existing hierarchies is not checked;
    /// on overlap the first-declared role wins during processing.
    pub fn add_hierarchy(
        &mut self,
        parent_brand: impl Into<String>,
        sub_brands: Vec<String>,
        aliases: Vec<String>,
    ) {
        let hierarchy = BrandHierarchy::new(parent_brand, sub_brands, aliases);
        tracing::debug!(
            parent_brand = %hierarchy.parent_brand,
            sub_brands = hierarchy.sub_brands.len(),
            aliases = hierarchy.aliases.len(),
            "hierarchy added"
        );
        self.config.hierarchies.push(hierarchy);
    }

    /// Rewrite a codeframe's brand entries into parent/child/alias form.
    ///
    /// Output order: synthesized entries in hierarchy order, then original
    /// brand entries whose code was not synthesized, then every non-brand
    /// entry, each group in original order. Returned unchanged when roll-up
    /// is disabled.
    #[must_use]
    pub fn process_codeframe(&self, codeframe: Codeframe) -> Codeframe {
        if !self.config.rollup_enabled {
            return codeframe;
        }

        // Entries this call re-synthesizes give up their numerics, so a second
        // pass over processed output reproduces the same ids.
        let replaced = self.synthesized_codes();
        let mut numerics = NumericAllocator::new(
            codeframe
                .entries
                .iter()
                .filter(|e| !(e.is_brand() && replaced.contains(&e.code)))
                .map(|e| e.numeric)
                .collect(),
        );
        let mut seen: HashSet<String> = HashSet::new();
        let mut synthesized: Vec<CodeframeEntry> = Vec::new();

        for (position, hierarchy) in (0u32..).zip(&self.config.hierarchies) {
            let parent_code = hierarchy.parent_code();
            let parent_numeric = numerics.claim(
                PARENT_NUMERIC_BASE.saturating_add(position.saturating_mul(PARENT_NUMERIC_STEP)),
            );

            if seen.insert(parent_code.clone()) {
                let mut parent = CodeframeEntry::new(
                    parent_code.clone(),
                    parent_numeric,
                    hierarchy.parent_brand.clone(),
                )
                .with_definition(self.parent_definition(hierarchy))
                .with_category(BRAND_AWARENESS_CATEGORY);
                parent.is_parent = true;
                synthesized.push(parent);
            }

            if !self.config.preserve_sub_brands {
                continue;
            }

            for (index, sub_brand) in (0u32..).zip(&hierarchy.sub_brands) {
                let code = brand_code(sub_brand);
                if !seen.insert(code.clone()) {
                    continue;
                }
                let numeric = numerics.claim(
                    parent_numeric
                        .saturating_add(CHILD_NUMERIC_OFFSET)
                        .saturating_add(index),
                );
                let mut child = CodeframeEntry::new(code, numeric, sub_brand.clone())
                    .with_definition(format!("Sub-brand of {}.", hierarchy.parent_brand))
                    .with_category(BRAND_AWARENESS_CATEGORY);
                child.parent_code = Some(parent_code.clone());
                synthesized.push(child);
            }

            for alias in &hierarchy.aliases {
                let code = brand_code(alias);
                if !seen.insert(code.clone()) {
                    continue;
                }
                let mut entry = CodeframeEntry::new(code, numerics.claim_alias(), alias.clone())
                    .with_definition(format!("Alternative name for {}.", hierarchy.parent_brand))
                    .with_category(BRAND_AWARENESS_CATEGORY);
                entry.parent_code = Some(parent_code.clone());
                entry.is_alias = true;
                synthesized.push(entry);
            }
        }

        let untouched_brands = codeframe
            .entries
            .iter()
            .filter(|e| e.is_brand() && !seen.contains(&e.code))
            .cloned();
        let mut used_codes: HashSet<String> =
            codeframe.entries.iter().map(|e| e.code.clone()).collect();
        used_codes.extend(seen.iter().cloned());
        let non_brands = codeframe
            .entries
            .iter()
            .filter(|e| !e.is_brand())
            .map(|e| {
                let mut entry = e.clone();
                if seen.contains(&entry.code) {
                    let renamed = unused_code(&used_codes, &entry.code);
                    tracing::warn!(
                        group_id = %codeframe.group_id,
                        code = %entry.code,
                        renamed = %renamed,
                        "non-brand code clashes with a synthesized brand code; renaming"
                    );
                    used_codes.insert(renamed.clone());
                    entry.code = renamed;
                }
                entry
            })
            .collect::<Vec<_>>();
        let entries: Vec<CodeframeEntry> = synthesized
            .into_iter()
            .chain(untouched_brands)
            .chain(non_brands)
            .collect();

        tracing::info!(
            group_id = %codeframe.group_id,
            hierarchies = self.config.hierarchies.len(),
            entries_before = codeframe.entries.len(),
            entries_after = entries.len(),
            "brand hierarchies applied"
        );

        Codeframe {
            entries,
            ..codeframe
        }
    }

    /// Every code `process_codeframe` emits for the current configuration.
    fn synthesized_codes(&self) -> HashSet<String> {
        let mut codes = HashSet::new();
        for hierarchy in &self.config.hierarchies {
            codes.insert(hierarchy.parent_code());
            if self.config.preserve_sub_brands {
                codes.extend(hierarchy.member_codes());
            }
        }
        codes
    }

    fn parent_definition(&self, hierarchy: &BrandHierarchy) -> String {
        let mut definition = if hierarchy.sub_brands.is_empty() {
            format!("All mentions of {}.", hierarchy.parent_brand)
        } else {
            format!(
                "All mentions of {}, including: {}.",
                hierarchy.parent_brand,
                hierarchy.sub_brands.join(", ")
            )
        };
        if !self.config.preserve_sub_brands && !hierarchy.aliases.is_empty() {
            definition.push_str(&format!(" Also known as: {}.", hierarchy.aliases.join(", ")));
        }
        definition
    }

    /// Add each parent code to every response carrying one of its sub-brand
    /// or alias codes.
    ///
    /// Never removes a code and preserves response order. Responses without
    /// a member code come back unchanged, as does everything when roll-up is
    /// disabled.
    #[must_use]
    pub fn roll_up_responses(&self, responses: &[CodedResponse]) -> Vec<CodedResponse> {
        if !self.config.rollup_enabled {
            return responses.to_vec();
        }

        let mut parents_by_member: HashMap<String, Vec<String>> = HashMap::new();
        for hierarchy in &self.config.hierarchies {
            let parent_code = hierarchy.parent_code();
            for member in hierarchy.member_codes() {
                parents_by_member
                    .entry(member)
                    .or_default()
                    .push(parent_code.clone());
            }
        }

        responses
            .iter()
            .map(|response| {
                let parents: Vec<String> = response
                    .codes_assigned
                    .iter()
                    .filter_map(|code| parents_by_member.get(code))
                    .flatten()
                    .cloned()
                    .collect();
                let mut rolled = response.clone();
                rolled.codes_assigned.extend(parents);
                rolled
            })
            .collect()
    }

    /// Propose hierarchies for reference families that match at least two
    /// brand entries of `codeframe`.
    ///
    /// An entry matches a family when its label contains one of the family's
    /// members, ignoring case. Families whose parent is already configured
    /// are skipped. Configuration is not modified.
    #[must_use]
    pub fn suggest_hierarchies(&self, codeframe: &Codeframe) -> Vec<BrandHierarchy> {
        let configured: HashSet<String> = self
            .config
            .hierarchies
            .iter()
            .map(|h| h.parent_brand.to_lowercase())
            .collect();

        let brand_labels: Vec<&str> = codeframe
            .entries
            .iter()
            .filter(|e| e.is_brand() && !e.is_parent && !e.is_alias)
            .map(|e| e.label.as_str())
            .collect();

        self.reference_families
            .iter()
            .filter(|family| !configured.contains(&family.parent.to_lowercase()))
            .filter_map(|family| {
                let members: Vec<String> =
                    family.members.iter().map(|m| m.to_lowercase()).collect();
                let mut matched: Vec<String> = Vec::new();
                for label in &brand_labels {
                    let lowered = label.to_lowercase();
                    if members.iter().any(|m| lowered.contains(m.as_str()))
                        && !matched.iter().any(|l| l.eq_ignore_ascii_case(label))
                    {
                        matched.push((*label).to_string());
                    }
                }
                (matched.len() >= 2).then(|| {
                    BrandHierarchy::new(family.parent.clone(), matched, Vec::new())
                })
            })
            .collect()
    }

    /// Render the configuration as an indented tree.
    #[must_use]
    pub fn generate_hierarchy_summary(&self) -> String {
        let mut lines = vec![
            format!("Brand hierarchies: {}", self.config.hierarchies.len()),
            format!("Roll-up enabled: {}", yes_no(self.config.rollup_enabled)),
            format!(
                "Preserve sub-brands: {}",
                yes_no(self.config.preserve_sub_brands)
            ),
        ];

        if self.config.hierarchies.is_empty() {
            lines.push(String::new());
            lines.push("(no hierarchies configured)".to_string());
        }

        for hierarchy in &self.config.hierarchies {
            lines.push(String::new());
            lines.push(format!(
                "{} [{}]",
                hierarchy.parent_brand,
                hierarchy.parent_code()
            ));
            for sub_brand in &hierarchy.sub_brands {
                lines.push(format!("  sub-brand: {sub_brand} [{}]", brand_code(sub_brand)));
            }
            for alias in &hierarchy.aliases {
                lines.push(format!("  alias: {alias} [{}]", brand_code(alias)));
            }
        }

        lines.join("\n")
    }

    /// Snapshot of the active configuration.
    #[must_use]
    pub fn export_config(&self) -> BrandRollupConfig {
        self.config.clone()
    }

    /// Replace the active configuration. Reference families are kept.
    pub fn import_config(&mut self, config: BrandRollupConfig) {
        tracing::debug!(hierarchies = config.hierarchies.len(), "hierarchy config imported");
        self.config = config;
    }
}

/// `code_2`, `code_3`, ... whichever is first free.
fn unused_code(used: &HashSet<String>, code: &str) -> String {
    (2u32..)
        .map(|n| format!("{code}_{n}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| format!("{code}_{}", used.len() + 2))
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
#[path = "hierarchy_test.rs"]
mod tests;
