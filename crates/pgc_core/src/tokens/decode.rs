//! Token list -> argument model.

use crate::config::is_builtin_filter;
use crate::models::{non_empty, ArgumentModel};

use super::geometry::split_geometry;
use super::{is_variable_flag, GEOMETRY_PREFIX};

/// Decode pandoc arguments into an [`ArgumentModel`].
///
/// One left-to-right pass. Each recognized pattern fills its field the
/// first time it is seen; anything else (including a repeat of a field
/// that is already filled, or a flag missing its value) is kept verbatim
/// in `opaque_tokens`. The built-in Lua filter is dropped because the
/// encoder re-inserts it.
///
/// `output_format` and `metadata` are not carried by tokens and keep their
/// defaults.
pub fn decode<S: AsRef<str>>(tokens: &[S]) -> ArgumentModel {
    let mut model = ArgumentModel::default();
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i].as_ref();
        let next = tokens.get(i + 1).map(AsRef::as_ref);

        match recognize(&mut model, token, next) {
            0 => {
                model.opaque_tokens.push(token.to_string());
                i += 1;
            }
            consumed => i += consumed,
        }
    }

    model
}

/// Try to absorb `token` (and possibly `next`) into the model.
///
/// Returns the number of tokens consumed, 0 when the token is opaque.
fn recognize(model: &mut ArgumentModel, token: &str, next: Option<&str>) -> usize {
    let opts = &mut model.options;

    let flag = match token {
        "--wrap=preserve" => Some(&mut opts.wrap_preserve),
        "--toc" => Some(&mut opts.table_of_contents),
        "--number-sections" => Some(&mut opts.number_sections),
        "--citeproc" => Some(&mut opts.citeproc),
        "--standalone" => Some(&mut opts.standalone),
        _ => None,
    };
    if let Some(slot) = flag {
        return if *slot {
            0
        } else {
            *slot = true;
            1
        };
    }

    if is_variable_flag(token) {
        return match next {
            Some(pair) if claim_variable(model, pair) => 2,
            _ => 0,
        };
    }

    match token {
        "--from" => {
            return match next {
                Some(value) if claim_string(&mut model.options.markdown_extensions, value) => 2,
                _ => 0,
            };
        }
        "--lua-filter" => {
            return match next {
                Some(value) if is_builtin_filter(value) => 2,
                Some(value) if claim_option(&mut model.lua_filter_path, value) => 2,
                _ => 0,
            };
        }
        _ => {}
    }

    // Options that take a value either as `--opt=value` or `--opt value`.
    let (name, inline) = match token.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (token, None),
    };
    let (value, consumed) = match (inline, next) {
        (Some(value), _) => (value, 1),
        (None, Some(value)) => (value, 2),
        (None, None) => return 0,
    };

    let claimed = match name {
        "--pdf-engine" => claim_string(&mut model.options.pdf_engine, value),
        "--template" => claim_option(&mut model.template_path, value),
        "--css" => claim_option(&mut model.css_path, value),
        "--bibliography" => claim_option(&mut model.bibliography_path, value),
        _ => false,
    };
    if claimed {
        consumed
    } else {
        0
    }
}

/// Absorb a `-V key=value` pair when the key has a structured field.
///
/// Geometry parts that are not margins go back to the opaque tokens as
/// their own `-V geometry:` pair, right where the original pair stood.
fn claim_variable(model: &mut ArgumentModel, pair: &str) -> bool {
    if let Some(geometry) = pair.strip_prefix(GEOMETRY_PREFIX) {
        if !model.options.margins.is_empty() {
            return false;
        }
        let Some((margins, rest)) = split_geometry(geometry) else {
            return false;
        };
        model.options.margins = margins;
        if let Some(rest) = rest {
            model.opaque_tokens.push("-V".to_string());
            model.opaque_tokens.push(format!("{}{}", GEOMETRY_PREFIX, rest));
        }
        return true;
    }

    let opts = &mut model.options;
    let Some((key, value)) = pair.split_once('=') else {
        return false;
    };
    match key {
        "documentclass" => claim_string(&mut opts.document_class, value),
        "classoption" => claim_string(&mut opts.class_option, value),
        "fontsize" => claim_string(&mut opts.font_size, value),
        "papersize" => claim_string(&mut opts.paper_size, value),
        _ => false,
    }
}

fn claim_string(slot: &mut String, value: &str) -> bool {
    match non_empty(value) {
        Some(value) if slot.is_empty() => {
            *slot = value.to_string();
            true
        }
        _ => false,
    }
}

fn claim_option(slot: &mut Option<String>, value: &str) -> bool {
    match non_empty(value) {
        Some(value) if slot.is_none() => {
            *slot = Some(value.to_string());
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Margins;
    use crate::tokens::TokenEncoder;

    fn toks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn structured_model() -> ArgumentModel {
        let mut model = ArgumentModel::default();
        let opts = &mut model.options;
        opts.wrap_preserve = true;
        opts.table_of_contents = true;
        opts.citeproc = true;
        opts.pdf_engine = "xelatex".into();
        opts.document_class = "bxjsarticle".into();
        opts.class_option = "pandoc".into();
        opts.font_size = "12pt".into();
        opts.paper_size = "a4paper".into();
        opts.markdown_extensions = "markdown+hard_line_breaks".into();
        opts.margins = Margins {
            top: Some("20mm".into()),
            bottom: Some("20mm".into()),
            footskip: Some("10mm".into()),
            ..Default::default()
        };
        model.template_path = Some("/tpl/report.latex".into());
        model.lua_filter_path = Some("/filters/extra.lua".into());
        model.css_path = Some("style.css".into());
        model.bibliography_path = Some("refs.bib".into());
        model
    }

    #[test]
    fn structured_model_round_trips() {
        let model = structured_model();
        let tokens = TokenEncoder::bare().encode(&model);
        assert_eq!(decode(&tokens), model);
    }

    #[test]
    fn margin_subset_round_trips() {
        let mut model = ArgumentModel::default();
        model.options.margins = Margins {
            top: Some("20mm".into()),
            left: Some("25mm".into()),
            ..Default::default()
        };

        let tokens = TokenEncoder::bare().encode(&model);
        assert_eq!(tokens, toks(&["-V", "geometry:top=20mm,left=25mm"]));

        let decoded = decode(&tokens);
        assert_eq!(decoded.options.margins.top.as_deref(), Some("20mm"));
        assert_eq!(decoded.options.margins.left.as_deref(), Some("25mm"));
        assert_eq!(decoded.options.margins.bottom, None);
        assert_eq!(decoded.options.margins.right, None);
        assert_eq!(decoded.options.margins.footskip, None);
    }

    #[test]
    fn unknown_tokens_keep_relative_order() {
        let tokens = toks(&[
            "--shift-heading-level-by=1",
            "--toc",
            "--dpi=300",
            "-V",
            "linkcolor=blue",
            "--number-sections",
            "--highlight-style",
            "tango",
        ]);
        let model = decode(&tokens);
        assert!(model.options.table_of_contents);
        assert!(model.options.number_sections);
        assert_eq!(
            model.opaque_tokens,
            toks(&[
                "--shift-heading-level-by=1",
                "--dpi=300",
                "-V",
                "linkcolor=blue",
                "--highlight-style",
                "tango",
            ])
        );

        let encoded = TokenEncoder::bare().encode(&model);
        assert_eq!(
            encoded,
            toks(&[
                "--toc",
                "--number-sections",
                "--shift-heading-level-by=1",
                "--dpi=300",
                "-V",
                "linkcolor=blue",
                "--highlight-style",
                "tango",
            ])
        );
    }

    #[test]
    fn bare_margin_sets_all_sides() {
        let model = decode(&toks(&["-V", "geometry:margin=15mm"]));
        assert_eq!(model.options.margins, Margins::uniform("15mm"));
        assert!(model.opaque_tokens.is_empty());
    }

    #[test]
    fn builtin_filter_is_dropped_and_user_filter_claimed() {
        let model = decode(&toks(&[
            "--lua-filter",
            "/app/filters/default_filter.lua",
            "--lua-filter",
            "/home/me/extra.lua",
            "--lua-filter",
            "/home/me/second.lua",
        ]));
        assert_eq!(model.lua_filter_path.as_deref(), Some("/home/me/extra.lua"));
        assert_eq!(model.opaque_tokens, toks(&["--lua-filter", "/home/me/second.lua"]));
    }

    #[test]
    fn two_token_forms_are_accepted() {
        let model = decode(&toks(&[
            "--pdf-engine",
            "lualatex",
            "--template",
            "t.latex",
            "--bibliography",
            "refs.bib",
            "--variable",
            "fontsize=10pt",
        ]));
        assert_eq!(model.options.pdf_engine, "lualatex");
        assert_eq!(model.template_path.as_deref(), Some("t.latex"));
        assert_eq!(model.bibliography_path.as_deref(), Some("refs.bib"));
        assert_eq!(model.options.font_size, "10pt");
        assert!(model.opaque_tokens.is_empty());
    }

    #[test]
    fn repeats_and_dangling_flags_stay_opaque() {
        let model = decode(&toks(&[
            "--toc",
            "--toc",
            "-V",
            "fontsize=10pt",
            "-V",
            "fontsize=12pt",
            "--from",
        ]));
        assert!(model.options.table_of_contents);
        assert_eq!(model.options.font_size, "10pt");
        assert_eq!(
            model.opaque_tokens,
            toks(&["--toc", "-V", "fontsize=12pt", "--from"])
        );
    }

    #[test]
    fn unparseable_geometry_stays_opaque() {
        let model = decode(&toks(&["-V", "geometry:landscape"]));
        assert!(model.options.margins.is_empty());
        assert_eq!(model.opaque_tokens, toks(&["-V", "geometry:landscape"]));
    }

    #[test]
    fn geometry_extras_stay_next_to_their_margins() {
        let model = decode(&toks(&[
            "--toc",
            "-V",
            "geometry:top=1cm,landscape,paperwidth=10in",
            "--dpi=300",
        ]));
        assert_eq!(model.options.margins.top.as_deref(), Some("1cm"));
        assert_eq!(
            model.opaque_tokens,
            toks(&["-V", "geometry:landscape,paperwidth=10in", "--dpi=300"])
        );

        let encoded = TokenEncoder::bare().encode(&model);
        assert_eq!(
            encoded,
            toks(&[
                "--toc",
                "-V",
                "geometry:top=1cm",
                "-V",
                "geometry:landscape,paperwidth=10in",
                "--dpi=300",
            ])
        );
        assert_eq!(decode(&encoded), model);
    }

    #[test]
    fn padded_values_are_trimmed() {
        let model = decode(&toks(&[
            "--pdf-engine= lualatex ",
            "-V",
            "fontsize= 10pt",
            "--template",
            " t.latex",
        ]));
        assert_eq!(model.options.pdf_engine, "lualatex");
        assert_eq!(model.options.font_size, "10pt");
        assert_eq!(model.template_path.as_deref(), Some("t.latex"));
        assert!(model.opaque_tokens.is_empty());
    }

    #[test]
    fn unknown_option_with_equals_is_opaque() {
        let model = decode(&toks(&["--dpi=300", "--resource-path=."]));
        assert_eq!(model.opaque_tokens, toks(&["--dpi=300", "--resource-path=."]));
    }
}
