//! Argument model -> token list.

use crate::config::AppPaths;
use crate::models::{non_empty, ArgumentModel};
use crate::paths;

use super::geometry::format_geometry;
use super::GEOMETRY_PREFIX;

/// Encodes an [`ArgumentModel`] into pandoc arguments.
///
/// With [`AppPaths`] the encoder inserts the built-in Lua filter (when it is
/// installed) and resolves the additional filter path. The bare encoder does
/// neither and is what profiles are persisted with.
#[derive(Debug, Clone, Copy)]
pub struct TokenEncoder<'a> {
    paths: Option<&'a AppPaths>,
}

impl<'a> TokenEncoder<'a> {
    /// Encoder for real invocations.
    pub fn new(paths: &'a AppPaths) -> Self {
        Self { paths: Some(paths) }
    }

    /// Encoder without resource lookup.
    pub fn bare() -> Self {
        Self { paths: None }
    }

    /// Encode the model. Output order is fixed; see the module docs.
    pub fn encode(&self, model: &ArgumentModel) -> Vec<String> {
        let opts = &model.options;
        let mut tokens = Vec::new();

        let flags = [
            (opts.wrap_preserve, "--wrap=preserve"),
            (opts.table_of_contents, "--toc"),
            (opts.number_sections, "--number-sections"),
            (opts.citeproc, "--citeproc"),
            (opts.standalone, "--standalone"),
        ];
        tokens.extend(
            flags
                .into_iter()
                .filter(|(on, _)| *on)
                .map(|(_, flag)| flag.to_string()),
        );

        if let Some(engine) = non_empty(&opts.pdf_engine) {
            tokens.push(format!("--pdf-engine={}", engine));
        }

        let variables = [
            ("documentclass", &opts.document_class),
            ("classoption", &opts.class_option),
            ("fontsize", &opts.font_size),
            ("papersize", &opts.paper_size),
        ];
        for (key, value) in variables {
            if let Some(value) = non_empty(value) {
                push_pair(&mut tokens, "-V", format!("{}={}", key, value));
            }
        }

        if let Some(geometry) = format_geometry(&opts.margins) {
            push_pair(&mut tokens, "-V", format!("{}{}", GEOMETRY_PREFIX, geometry));
        }

        if let Some(reader) = non_empty(&opts.markdown_extensions) {
            push_pair(&mut tokens, "--from", reader.to_string());
        }

        if let Some(builtin) = self.paths.and_then(AppPaths::builtin_filter) {
            push_pair(&mut tokens, "--lua-filter", paths::to_token(&builtin));
        }

        if let Some(filter) = model.lua_filter_path.as_deref().and_then(non_empty) {
            let resolved = match self.paths {
                Some(app) => paths::to_token(&app.resolve_filter(filter)),
                None => filter.to_string(),
            };
            push_pair(&mut tokens, "--lua-filter", resolved);
        }

        let files = [
            ("--template", &model.template_path),
            ("--css", &model.css_path),
            ("--bibliography", &model.bibliography_path),
        ];
        for (flag, value) in files {
            if let Some(value) = value.as_deref().and_then(non_empty) {
                tokens.push(format!("{}={}", flag, value));
            }
        }

        tokens.extend(model.opaque_tokens.iter().cloned());
        tokens
    }
}

fn push_pair(tokens: &mut Vec<String>, flag: &str, value: String) {
    tokens.push(flag.to_string());
    tokens.push(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BUILTIN_FILTER_NAME;
    use crate::models::Margins;
    use crate::tokens::decode;
    use std::fs;
    use tempfile::tempdir;

    fn full_model() -> ArgumentModel {
        let mut model = ArgumentModel::default();
        let opts = &mut model.options;
        opts.wrap_preserve = true;
        opts.table_of_contents = true;
        opts.number_sections = true;
        opts.citeproc = true;
        opts.standalone = true;
        opts.pdf_engine = "lualatex".into();
        opts.document_class = "bxjsarticle".into();
        opts.class_option = "pandoc".into();
        opts.font_size = "11pt".into();
        opts.paper_size = "a4".into();
        opts.margins = Margins {
            top: Some("20mm".into()),
            left: Some("25mm".into()),
            ..Default::default()
        };
        opts.markdown_extensions = "markdown+hard_line_breaks".into();
        model.lua_filter_path = Some("/filters/extra.lua".into());
        model.template_path = Some("tpl.latex".into());
        model.css_path = Some("style.css".into());
        model.bibliography_path = Some("refs.bib".into());
        model.opaque_tokens = vec!["--dpi=300".into()];
        model
    }

    #[test]
    fn encodes_in_fixed_order() {
        let tokens = TokenEncoder::bare().encode(&full_model());
        assert_eq!(
            tokens,
            vec![
                "--wrap=preserve",
                "--toc",
                "--number-sections",
                "--citeproc",
                "--standalone",
                "--pdf-engine=lualatex",
                "-V",
                "documentclass=bxjsarticle",
                "-V",
                "classoption=pandoc",
                "-V",
                "fontsize=11pt",
                "-V",
                "papersize=a4",
                "-V",
                "geometry:top=20mm,left=25mm",
                "--from",
                "markdown+hard_line_breaks",
                "--lua-filter",
                "/filters/extra.lua",
                "--template=tpl.latex",
                "--css=style.css",
                "--bibliography=refs.bib",
                "--dpi=300",
            ]
        );
    }

    #[test]
    fn empty_model_encodes_nothing() {
        assert!(TokenEncoder::bare().encode(&ArgumentModel::default()).is_empty());
    }

    #[test]
    fn blank_strings_are_unset() {
        let mut model = ArgumentModel::default();
        model.options.pdf_engine = "  ".into();
        model.template_path = Some(String::new());
        assert!(TokenEncoder::bare().encode(&model).is_empty());
    }

    #[test]
    fn builtin_filter_precedes_user_filter() {
        let dir = tempdir().unwrap();
        let app = AppPaths::new(dir.path(), dir.path().join("res"), dir.path().join("profiles"));
        fs::create_dir_all(app.filters_dir()).unwrap();
        fs::write(app.filters_dir().join(BUILTIN_FILTER_NAME), "").unwrap();
        fs::write(app.filters_dir().join("extra.lua"), "").unwrap();

        let mut model = ArgumentModel::default();
        model.lua_filter_path = Some("extra.lua".into());
        let tokens = TokenEncoder::new(&app).encode(&model);

        assert_eq!(
            tokens,
            vec![
                "--lua-filter".to_string(),
                paths::to_token(&app.filters_dir().join(BUILTIN_FILTER_NAME)),
                "--lua-filter".to_string(),
                paths::to_token(&app.filters_dir().join("extra.lua")),
            ]
        );
    }

    #[test]
    fn reencoding_inserts_builtin_filter_once() {
        let dir = tempdir().unwrap();
        let app = AppPaths::new(dir.path(), dir.path().join("res"), dir.path().join("profiles"));
        fs::create_dir_all(app.filters_dir()).unwrap();
        fs::write(app.filters_dir().join(BUILTIN_FILTER_NAME), "").unwrap();
        let builtin = paths::to_token(&app.filters_dir().join(BUILTIN_FILTER_NAME));

        let tokens: Vec<String> = [
            "--toc",
            "--lua-filter",
            "/old/install/filters/default_filter.lua",
            "--lua-filter",
            "/home/me/extra.lua",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let encoder = TokenEncoder::new(&app);
        let once = encoder.encode(&decode(&tokens));
        let twice = encoder.encode(&decode(&once));

        assert_eq!(once, twice);
        assert_eq!(once.iter().filter(|t| **t == builtin).count(), 1);
        assert_eq!(
            once.iter().filter(|t| t.ends_with(BUILTIN_FILTER_NAME)).count(),
            1
        );
        assert_eq!(
            once,
            vec![
                "--toc".to_string(),
                "--lua-filter".to_string(),
                builtin,
                "--lua-filter".to_string(),
                "/home/me/extra.lua".to_string(),
            ]
        );
    }

    #[test]
    fn normalized_model_round_trips() {
        let mut model = full_model();
        model.options.pdf_engine = " xelatex".into();
        model.options.font_size = "12pt  ".into();
        model.options.margins.top = Some(" 2cm ".into());
        model.template_path = Some("  tpl.latex".into());

        let decoded = decode(&TokenEncoder::bare().encode(&model));
        model.normalize();
        assert_eq!(decoded, model);
    }

    #[test]
    fn missing_builtin_filter_is_skipped() {
        let dir = tempdir().unwrap();
        let app = AppPaths::new(dir.path(), dir.path().join("res"), dir.path().join("profiles"));
        let mut model = ArgumentModel::default();
        model.options.table_of_contents = true;
        assert_eq!(TokenEncoder::new(&app).encode(&model), vec!["--toc"]);
    }
}
