//! Read-only registry of lesson categories and the priced bundles offered
//! under each of them.
//!
//! The built-in catalog is the full offering (multi-currency pricing plus the
//! placement and trial categories). Deployments can replace it with a TOML
//! document of the same shape.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::currency::CurrencyCode;
use crate::domain::offering::{BundleDefinition, BundleId, CategoryDefinition, CategoryId};

pub const BUILTIN_CATALOG_VERSION: &str = "2024.2-superset";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog document: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("catalog validation failed: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    version: String,
    categories: Vec<CategoryDefinition>,
    bundles: HashMap<CategoryId, Vec<BundleDefinition>>,
}

impl Catalog {
    /// Builds a catalog from categories paired with their bundles, in display
    /// order. Rejects duplicate ids and zero-lesson bundles.
    pub fn new(
        version: impl Into<String>,
        entries: Vec<(CategoryDefinition, Vec<BundleDefinition>)>,
    ) -> Result<Self, CatalogError> {
        validate_entries(&entries)?;
        Ok(Self::assemble(version, entries))
    }

    fn assemble(
        version: impl Into<String>,
        entries: Vec<(CategoryDefinition, Vec<BundleDefinition>)>,
    ) -> Self {
        let mut categories = Vec::with_capacity(entries.len());
        let mut bundles = HashMap::with_capacity(entries.len());
        for (category, category_bundles) in entries {
            bundles.insert(category.id.clone(), category_bundles);
            categories.push(category);
        }
        Self { version: version.into(), categories, bundles }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let document = toml::from_str::<CatalogDocument>(raw)?;
        document.into_catalog()
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn categories_in_order(&self) -> &[CategoryDefinition] {
        &self.categories
    }

    /// Bundles offered under `category_id`, empty when the id is unknown.
    pub fn bundles_for(&self, category_id: &CategoryId) -> &[BundleDefinition] {
        self.bundles.get(category_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find_category(&self, category_id: &CategoryId) -> Option<&CategoryDefinition> {
        self.categories.iter().find(|category| &category.id == category_id)
    }

    pub fn find_bundle(
        &self,
        category_id: &CategoryId,
        bundle_id: &BundleId,
    ) -> Option<&BundleDefinition> {
        self.bundles_for(category_id).iter().find(|bundle| &bundle.id == bundle_id)
    }

    pub fn builtin() -> Self {
        let entries = vec![
            (
                category(
                    "main",
                    "Structured Course",
                    "Step-by-step curriculum",
                    "Level-based lessons following a structured syllabus with a dedicated tutor.",
                ),
                vec![
                    bundle("main-single", "Single Lesson", 1, (15, 0), (450, 2), &[]),
                    bundle(
                        "main-10",
                        "10 Lesson Pack",
                        10,
                        (140, 0),
                        (4_200, 2),
                        &[("KWD", "4.200 KWD per lesson")],
                    ),
                    bundle("main-20", "20 Lesson Pack", 20, (260, 0), (7_800, 2), &[]),
                ],
            ),
            (
                category(
                    "conversation",
                    "Conversation Practice",
                    "Speak with confidence",
                    "Free-form speaking sessions focused on fluency and everyday topics.",
                ),
                vec![
                    bundle("conversation-single", "Single Session", 1, (12, 0), (375, 2), &[]),
                    bundle("conversation-8", "8 Session Pack", 8, (88, 0), (2_700, 2), &[]),
                    bundle("conversation-16", "16 Session Pack", 16, (160, 0), (4_900, 2), &[]),
                ],
            ),
            (
                category(
                    "placement",
                    "Placement Test",
                    "Find your level",
                    "A one-to-one assessment that places you at the right level before you start.",
                ),
                vec![bundle(
                    "placement-test",
                    "Placement Assessment",
                    1,
                    (10, 0),
                    (300, 2),
                    &[("USD", "$10 one-time assessment"), ("KWD", "3 KWD one-time assessment")],
                )],
            ),
            (
                category(
                    "trial",
                    "Free Trial",
                    "Try a lesson on us",
                    "A complimentary introductory lesson to meet a tutor and see how classes work.",
                ),
                vec![bundle(
                    "trial-lesson",
                    "Trial Lesson",
                    1,
                    (0, 0),
                    (0, 0),
                    &[("USD", "Free"), ("KWD", "Free")],
                )],
            ),
        ];

        Self::assemble(BUILTIN_CATALOG_VERSION, entries)
    }
}

fn validate_entries(
    entries: &[(CategoryDefinition, Vec<BundleDefinition>)],
) -> Result<(), CatalogError> {
    let mut category_ids = HashSet::new();
    for (category, bundles) in entries {
        if category.id.as_str().trim().is_empty() {
            return Err(CatalogError::Validation("category id must not be empty".to_string()));
        }
        if !category_ids.insert(&category.id) {
            return Err(CatalogError::Validation(format!(
                "duplicate category id `{}`",
                category.id
            )));
        }

        let mut bundle_ids = HashSet::new();
        for bundle in bundles {
            if bundle.id.as_str().trim().is_empty() {
                return Err(CatalogError::Validation(format!(
                    "bundle id must not be empty (category `{}`)",
                    category.id
                )));
            }
            if !bundle_ids.insert(&bundle.id) {
                return Err(CatalogError::Validation(format!(
                    "duplicate bundle id `{}` in category `{}`",
                    bundle.id, category.id
                )));
            }
            if bundle.unit_count == 0 {
                return Err(CatalogError::Validation(format!(
                    "bundle `{}` in category `{}` must contain at least one lesson",
                    bundle.id, category.id
                )));
            }
        }
    }
    Ok(())
}

fn category(id: &str, title: &str, subtitle: &str, description: &str) -> CategoryDefinition {
    CategoryDefinition {
        id: CategoryId::from(id),
        title: title.to_owned(),
        subtitle: subtitle.to_owned(),
        description: description.to_owned(),
    }
}

fn bundle(
    id: &str,
    title: &str,
    unit_count: u32,
    usd: (i64, u32),
    kwd: (i64, u32),
    labels: &[(&str, &str)],
) -> BundleDefinition {
    BundleDefinition {
        id: BundleId::from(id),
        title: title.to_owned(),
        unit_count,
        price_by_currency: BTreeMap::from([
            (CurrencyCode::usd(), Decimal::new(usd.0, usd.1)),
            (CurrencyCode::new("KWD"), Decimal::new(kwd.0, kwd.1)),
        ]),
        per_unit_label_by_currency: labels
            .iter()
            .map(|(code, label)| (CurrencyCode::new(code), (*label).to_owned()))
            .collect(),
    }
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    version: Option<String>,
    #[serde(default)]
    categories: Vec<CategoryDocument>,
}

#[derive(Debug, Deserialize)]
struct CategoryDocument {
    id: String,
    title: String,
    #[serde(default)]
    subtitle: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    bundles: Vec<BundleDocument>,
}

#[derive(Debug, Deserialize)]
struct BundleDocument {
    id: String,
    title: String,
    unit_count: u32,
    #[serde(default)]
    price_by_currency: BTreeMap<String, Decimal>,
    #[serde(default)]
    per_unit_label_by_currency: BTreeMap<String, String>,
}

impl CatalogDocument {
    fn into_catalog(self) -> Result<Catalog, CatalogError> {
        let entries = self
            .categories
            .into_iter()
            .map(|category| {
                let definition = CategoryDefinition {
                    id: CategoryId(category.id),
                    title: category.title,
                    subtitle: category.subtitle,
                    description: category.description,
                };
                let bundles = category
                    .bundles
                    .into_iter()
                    .map(|bundle| BundleDefinition {
                        id: BundleId(bundle.id),
                        title: bundle.title,
                        unit_count: bundle.unit_count,
                        price_by_currency: bundle
                            .price_by_currency
                            .into_iter()
                            .map(|(code, amount)| (CurrencyCode::new(code), amount))
                            .collect(),
                        per_unit_label_by_currency: bundle
                            .per_unit_label_by_currency
                            .into_iter()
                            .map(|(code, label)| (CurrencyCode::new(code), label))
                            .collect(),
                    })
                    .collect();
                (definition, bundles)
            })
            .collect();

        Catalog::new(self.version.unwrap_or_else(|| "unversioned".to_string()), entries)
    }
}
