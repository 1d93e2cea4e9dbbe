//! The `geometry:` variable: page margins packed into one token.

use crate::models::Margins;

/// Render margins as the value following `geometry:`.
///
/// Only set fields appear, comma-joined in top, bottom, left, right,
/// footskip order. Returns `None` when nothing is set.
pub fn format_geometry(margins: &Margins) -> Option<String> {
    let parts: Vec<String> = margins
        .entries()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    (!parts.is_empty()).then(|| parts.join(","))
}

/// Parse the value following `geometry:` into margins.
///
/// `margin=<v>` sets all four sides; other pairs set their own field and
/// unknown keys are ignored. Returns `None` if no margin was recognized,
/// so the caller can keep the whole token opaque instead.
pub fn parse_geometry(value: &str) -> Option<Margins> {
    split_geometry(value).map(|(margins, _)| margins)
}

/// [`parse_geometry`] that also returns the parts it did not recognize
/// (`landscape`, `paperwidth=10in`, ...), comma-joined in their original
/// order.
pub(crate) fn split_geometry(value: &str) -> Option<(Margins, Option<String>)> {
    let mut margins = Margins::default();
    let mut recognized = false;
    let mut rest = Vec::new();

    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((key, val)) = part.split_once('=') else {
            rest.push(part);
            continue;
        };
        let (key, val) = (key.trim(), val.trim());
        if key == "margin" {
            let footskip = margins.footskip.take();
            margins = Margins::uniform(val);
            margins.footskip = footskip;
            recognized = true;
        } else if let Some(slot) = margins.slot_mut(key) {
            *slot = Some(val.to_string());
            recognized = true;
        } else {
            rest.push(part);
        }
    }

    let rest = (!rest.is_empty()).then(|| rest.join(","));
    recognized.then_some((margins, rest))
}
