//! Conversion between defaults files and the argument model.

use std::path::Path;

use indexmap::IndexMap;

use super::types::{Project, ProjectDescriptor, VariableValue};
use crate::config::is_builtin_filter;
use crate::models::{non_empty, ArgumentModel};
use crate::paths;
use crate::tokens::{self, GEOMETRY_PREFIX};

/// Variables owned by the UI that never go into a defaults file.
const UI_ONLY_VARIABLES: [&str; 2] = ["documentclass", "classoption"];

/// Decode a defaults file into a [`Project`].
///
/// The descriptor is first rewritten as the pandoc arguments it stands for
/// and then run through [`tokens::decode`], so every key the token codec
/// knows lands in its structured field and the rest stays opaque.
/// Relative paths are resolved lexically against `base_dir`.
pub fn decode(descriptor: &ProjectDescriptor, base_dir: Option<&Path>) -> Project {
    let resolve = |value: &str| paths::to_token(&paths::resolve_against(base_dir, Path::new(value)));

    let input_files = descriptor
        .input_files
        .iter()
        .chain(&descriptor.bibliography)
        .filter_map(|file| non_empty(file))
        .map(|file| paths::resolve_against(base_dir, Path::new(file)))
        .collect();

    let flags = [
        (descriptor.toc, "--toc"),
        (descriptor.number_sections, "--number-sections"),
        (descriptor.citeproc, "--citeproc"),
        (descriptor.standalone, "--standalone"),
    ];
    let mut argv: Vec<String> = flags
        .into_iter()
        .filter(|(on, _)| on.unwrap_or(false))
        .map(|(_, flag)| flag.to_string())
        .collect();
    let mut push = |flag: &str, value: String| {
        argv.push(flag.to_string());
        argv.push(value);
    };

    // Blank values count as absent.
    if let Some(engine) = descriptor.pdf_engine.as_deref().and_then(non_empty) {
        push("--pdf-engine", engine.to_string());
    }
    if let Some(template) = descriptor.template.as_deref().and_then(non_empty) {
        push("--template", resolve(template));
    }
    if let Some(bib) = descriptor.bibliography.iter().find_map(|b| non_empty(b)) {
        push("--bibliography", resolve(bib));
    }

    for (key, value) in &descriptor.variables {
        if key == "geometry" {
            push("-V", format!("{}{}", GEOMETRY_PREFIX, value.items().join(",")));
        } else {
            for item in value.items() {
                push("-V", format!("{}={}", key, item));
            }
        }
    }

    for filter in descriptor.filters.iter().filter_map(|f| non_empty(f)) {
        if filter.ends_with(".lua") {
            push("--lua-filter", resolve(filter));
        } else {
            push("--filter", filter.to_string());
        }
    }

    if let Some(from) = descriptor.from.as_deref().and_then(non_empty) {
        push("--from", from.to_string());
    }
    if let Some(to) = descriptor.to.as_deref().and_then(non_empty) {
        push("--to", to.to_string());
    }

    for (key, value) in &descriptor.metadata {
        push("-M", format!("{}={}", key, value));
    }

    let mut args = tokens::decode(&argv);
    args.metadata = descriptor.metadata.clone();

    let mut output_filename = None;
    if let Some(output) = descriptor.output_file.as_deref().and_then(non_empty) {
        let output = Path::new(output);
        output_filename = output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        if let Some(ext) = output.extension() {
            args.output_format = ext.to_string_lossy().into_owned();
        }
    }

    tracing::debug!(
        "Decoded project: {} input(s), {} opaque token(s)",
        descriptor.input_files.len() + descriptor.bibliography.len(),
        args.opaque_tokens.len()
    );

    Project {
        args,
        input_files,
        output_filename,
        base_dir: base_dir.map(Path::to_path_buf),
    }
}

/// Encode a [`Project`] as a defaults file.
///
/// `.bib` inputs become the bibliography, everything else an input file.
/// Paths under the project's base directory are written relative to it.
/// `from`, `to`, the built-in filter and the UI-only document class
/// variables are never written.
pub fn encode(project: &Project) -> ProjectDescriptor {
    let base = project.base_dir.as_deref();
    let relative = |value: &str| paths::to_token(&paths::relativize(base, Path::new(value)));
    let args = &project.args;
    let opts = &args.options;

    let mut descriptor = ProjectDescriptor::default();

    for file in &project.input_files {
        let written = paths::to_token(&paths::relativize(base, file));
        if paths::extension_lower(file).as_deref() == Some("bib") {
            descriptor.bibliography.push(written);
        } else {
            descriptor.input_files.push(written);
        }
    }
    if let Some(bib) = args.bibliography_path.as_deref().and_then(non_empty) {
        let bib = relative(bib);
        if !descriptor.bibliography.contains(&bib) {
            descriptor.bibliography.push(bib);
        }
    }

    descriptor.output_file = project
        .output_filename
        .as_deref()
        .and_then(non_empty)
        .map(str::to_string);

    descriptor.toc = opts.table_of_contents.then_some(true);
    descriptor.number_sections = opts.number_sections.then_some(true);
    descriptor.citeproc = opts.citeproc.then_some(true);
    descriptor.standalone = opts.standalone.then_some(true);
    descriptor.pdf_engine = non_empty(&opts.pdf_engine).map(str::to_string);
    descriptor.template = args
        .template_path
        .as_deref()
        .and_then(non_empty)
        .map(relative);

    let mut variables = Variables::default();
    if let Some(size) = non_empty(&opts.font_size) {
        variables.insert("fontsize", size);
    }
    if let Some(size) = non_empty(&opts.paper_size) {
        variables.insert("papersize", size);
    }
    for (key, value) in opts.margins.entries() {
        variables.push_geometry(&format!("{}={}", key, value));
    }

    if let Some(filter) = args.lua_filter_path.as_deref().and_then(non_empty) {
        descriptor.filters.push(relative(filter));
    }

    let mut metadata = IndexMap::new();
    let opaque = &args.opaque_tokens;
    let mut i = 0;
    while i < opaque.len() {
        let Some(value) = opaque.get(i + 1) else {
            break;
        };
        let flag = opaque[i].as_str();
        if tokens::is_variable_flag(flag) {
            if let Some(geometry) = value.strip_prefix(GEOMETRY_PREFIX) {
                geometry.split(',').for_each(|part| variables.push_geometry(part));
            } else if let Some((key, val)) = value.split_once('=') {
                if !UI_ONLY_VARIABLES.contains(&key) {
                    variables.insert(key, val);
                }
            }
        } else if tokens::is_metadata_flag(flag) {
            if let Some((key, val)) = value.split_once('=') {
                metadata.insert(key.to_string(), val.to_string());
            }
        } else if flag == "--lua-filter" {
            if !is_builtin_filter(value) {
                descriptor.filters.push(relative(value));
            }
        } else if flag == "--filter" || flag == "-F" {
            descriptor.filters.push(value.clone());
        } else {
            i += 1;
            continue;
        }
        i += 2;
    }

    for (key, value) in &args.metadata {
        metadata.insert(key.clone(), value.clone());
    }

    descriptor.variables = variables.finish();
    descriptor.metadata = metadata;
    descriptor
}

/// Variable collector: repeated keys become lists, geometry parts are
/// de-duplicated in first-seen order.
#[derive(Default)]
struct Variables {
    map: IndexMap<String, VariableValue>,
    geometry: Vec<String>,
}

impl Variables {
    fn insert(&mut self, key: &str, value: &str) {
        match self.map.get_mut(key) {
            None => {
                self.map
                    .insert(key.to_string(), VariableValue::Scalar(value.to_string()));
            }
            Some(VariableValue::List(items)) => items.push(value.to_string()),
            Some(existing @ VariableValue::Scalar(_)) => {
                let mut items: Vec<String> =
                    existing.items().into_iter().map(str::to_string).collect();
                items.push(value.to_string());
                *existing = VariableValue::List(items);
            }
        }
    }

    fn push_geometry(&mut self, part: &str) {
        let part = part.trim();
        if !part.is_empty() && !self.geometry.iter().any(|p| p == part) {
            self.geometry.push(part.to_string());
        }
    }

    fn finish(mut self) -> IndexMap<String, VariableValue> {
        if !self.geometry.is_empty() {
            self.map
                .insert("geometry".to_string(), VariableValue::List(self.geometry));
        }
        self.map
    }
}

impl From<ArgumentModel> for Project {
    fn from(args: ArgumentModel) -> Self {
        Project {
            args,
            ..Default::default()
        }
    }
}
