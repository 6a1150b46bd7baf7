//! Matching an attribute selection (color, size, ...) to a product variant.
//!
//! The backend does not always send structured attribute values for
//! variants. When it does not, the selection is matched against SKUs that
//! embed short attribute tokens: the first three letters of the value
//! followed by the first three letters of the attribute name, upper-cased
//! (`color = Blue` becomes `BLUCOL`, `size = M` becomes `MSIZ`).

use crate::catalog::{AttributeValue, Variant};

/// Why no variant could be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VariantError {
    #[error("This product has no variants")]
    NoVariants,
    #[error("This combination is not available")]
    CombinationNotAvailable,
}

/// How a variant was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The variant's attribute values equal the selection.
    Attributes,
    /// The variant's SKU carries every selection token.
    Sku,
    /// The product has a single variant, whatever was selected.
    SingleVariant,
}

/// A variant chosen for a selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<'a> {
    pub variant: &'a Variant,
    pub kind: MatchKind,
}

/// SKU token for one attribute value.
#[must_use]
pub fn encode_token(name: &str, value: &str) -> String {
    let prefix = |s: &str| s.trim().chars().take(3).collect::<String>().to_uppercase();
    format!("{}{}", prefix(value), prefix(name))
}

/// Pick the variant for `selection`.
///
/// Tries structured attributes first, then SKU tokens, then falls back to the
/// only variant when there is exactly one.
///
/// # Errors
///
/// [`VariantError::NoVariants`] for an empty variant list and
/// [`VariantError::CombinationNotAvailable`] when nothing matches among
/// several variants.
pub fn resolve<'a>(
    variants: &'a [Variant],
    selection: &[AttributeValue],
) -> Result<Resolved<'a>, VariantError> {
    if variants.is_empty() {
        return Err(VariantError::NoVariants);
    }

    if !selection.is_empty() {
        if let Some(variant) = variants.iter().find(|v| matches_attributes(v, selection)) {
            return Ok(Resolved {
                variant,
                kind: MatchKind::Attributes,
            });
        }
        if let Some(variant) = match_sku(variants, selection) {
            return Ok(Resolved {
                variant,
                kind: MatchKind::Sku,
            });
        }
    }

    match variants {
        [only] => Ok(Resolved {
            variant: only,
            kind: MatchKind::SingleVariant,
        }),
        _ => Err(VariantError::CombinationNotAvailable),
    }
}

fn matches_attributes(variant: &Variant, selection: &[AttributeValue]) -> bool {
    !variant.attributes.is_empty()
        && variant.attributes.len() == selection.len()
        && selection.iter().all(|s| {
            variant
                .attribute(&s.name)
                .is_some_and(|v| v.trim().eq_ignore_ascii_case(s.value.trim()))
        })
}

fn match_sku<'a>(variants: &'a [Variant], selection: &[AttributeValue]) -> Option<&'a Variant> {
    let tokens: Vec<String> = selection
        .iter()
        .map(|s| encode_token(&s.name, &s.value))
        .collect();
    let joined = tokens.concat();

    let mut candidates = variants.iter().filter(|v| {
        let sku = v.sku.to_uppercase();
        !sku.is_empty() && tokens.iter().all(|t| sku.contains(t.as_str()))
    });

    let first = candidates.next()?;
    if first.sku.to_uppercase().contains(&joined) {
        return Some(first);
    }
    candidates
        .find(|v| v.sku.to_uppercase().contains(&joined))
        .or(Some(first))
}

/// One selectable value of an option group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionValue {
    pub value: String,
    pub selected: bool,
    pub available: bool,
}

/// An attribute and the values offered for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionGroup {
    pub name: String,
    pub values: Vec<OptionValue>,
}

/// Attribute groups in order of first appearance, with distinct values.
///
/// A value is available when at least one in-stock variant carries it.
#[must_use]
pub fn option_groups(variants: &[Variant], selection: &[AttributeValue]) -> Vec<OptionGroup> {
    let mut groups: Vec<OptionGroup> = Vec::new();

    for variant in variants {
        for attr in &variant.attributes {
            let group_index = match groups
                .iter()
                .position(|g| g.name.eq_ignore_ascii_case(&attr.name))
            {
                Some(i) => i,
                None => {
                    groups.push(OptionGroup {
                        name: attr.name.clone(),
                        values: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            let Some(group) = groups.get_mut(group_index) else {
                continue;
            };

            let selected = selection.iter().any(|s| {
                s.name.eq_ignore_ascii_case(&attr.name) && s.value.eq_ignore_ascii_case(&attr.value)
            });
            match group
                .values
                .iter_mut()
                .find(|v| v.value.eq_ignore_ascii_case(&attr.value))
            {
                Some(existing) => existing.available |= variant.in_stock(),
                None => group.values.push(OptionValue {
                    value: attr.value.clone(),
                    selected,
                    available: variant.in_stock(),
                }),
            }
        }
    }

    groups
}

/// Attributes of the first in-stock variant (or the first variant), used to
/// pre-select options on the product page.
#[must_use]
pub fn default_selection(variants: &[Variant]) -> Vec<AttributeValue> {
    variants
        .iter()
        .find(|v| v.in_stock())
        .or_else(|| variants.first())
        .map(|v| v.attributes.clone())
        .unwrap_or_default()
}

/// Whether `name` is an option of these variants: a structured attribute
/// name, or a name whose code follows a value code in some SKU.
#[must_use]
pub fn names_option(variants: &[Variant], name: &str) -> bool {
    let name = name.trim();
    if name.is_empty() {
        return false;
    }
    let code = name.chars().take(3).collect::<String>().to_uppercase();
    variants.iter().any(|v| {
        v.attributes.iter().any(|a| a.name.trim().eq_ignore_ascii_case(name))
            || v.sku
                .to_uppercase()
                .match_indices(code.as_str())
                .any(|(at, _)| at > 0)
    })
}
