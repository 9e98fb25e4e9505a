use std::collections::BTreeMap;

use anyhow::{Context as AnyhowContext, Result, bail};
use serde_json::{Map, Value as JsonValue, json};

use super::vocab::{self, CONTEXT, Term};

/// Active context built from the inline `@context` of a document.
#[derive(Debug, Clone, Default)]
pub(crate) struct Context {
    pub(crate) language: Option<String>,
    pub(crate) vocab: Option<Term>,
    pub(crate) term_map: BTreeMap<String, Term>,
}

impl Context {
    pub(crate) fn insert(&mut self, term: &str, definition: Term) {
        self.term_map.insert(term.to_owned(), definition);
    }
    pub(crate) fn get_term(&self, term: &str) -> Option<&Term> {
        self.term_map.get(term)
    }

    /// Expands a key or a `@type` value against the active context.
    ///
    /// Absolute IRIs and keywords pass through, compact IRIs use their
    /// prefix definition, bare terms use term definitions then `@vocab`.
    pub(crate) fn expand_iri(&self, value: &str) -> String {
        if value_is_keyword(value) {
            return value.to_owned();
        }
        if let Some(definition) = self.get_term(value) {
            return definition.as_str().to_owned();
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if suffix.starts_with("//") {
                return value.to_owned();
            }
            if let Some(expanded) = self.get_term(prefix).and_then(|t| t.join(suffix)) {
                return expanded.as_str().to_owned();
            }
            return value.to_owned();
        }
        if let Some(expanded) = self.vocab.as_ref().and_then(|v| v.join(value)) {
            return expanded.as_str().to_owned();
        }
        value.to_owned()
    }

    /// Layers the `@context` found on a node object, if any, on top of self.
    fn scoped(&self, node: &Map<String, JsonValue>) -> Result<Context> {
        match node.get(CONTEXT.as_str()) {
            Some(local) => {
                let mut result = self.clone();
                process_contexts(local, &mut result)?;
                Ok(result)
            }
            None => Ok(self.clone()),
        }
    }
}

impl TryFrom<&JsonValue> for Context {
    type Error = anyhow::Error;

    /// Convert node context to an active context using the algorithm defined in
    /// https://www.w3.org/TR/json-ld11-api/#algorithm
    ///
    /// Only local contexts are processed. Remote contexts are never fetched,
    /// and a document without `@context` yields the empty context.
    fn try_from(value: &JsonValue) -> Result<Context> {
        let node = value.as_object().context("value should be a JSON object")?;
        let mut result = Context::default();
        if let Some(context_def) = node.get(CONTEXT.as_str()) {
            process_contexts(context_def, &mut result)?;
        }
        Ok(result)
    }
}

/// Rewrites every key and `@type` value of the document to absolute IRIs
/// and drops `@context` entries.
pub(crate) fn expand_document(document: &JsonValue) -> Result<JsonValue> {
    expand_value(document, &Context::default())
}

fn expand_value(value: &JsonValue, active: &Context) -> Result<JsonValue> {
    match value {
        JsonValue::Array(items) => Ok(JsonValue::Array(
            items
                .iter()
                .map(|item| expand_value(item, active))
                .collect::<Result<_>>()?,
        )),
        JsonValue::Object(map) => {
            let scoped = active.scoped(map)?;
            let mut expanded = Map::new();
            for (key, item) in map {
                if key == CONTEXT.as_str() {
                    continue;
                }
                let key = scoped.expand_iri(key);
                let item = if key == vocab::TYPE.as_str() {
                    expand_type(item, &scoped)
                } else if [vocab::ID, vocab::VALUE, vocab::LANGUAGE]
                    .iter()
                    .any(|keyword| keyword.as_str() == key)
                {
                    item.clone()
                } else {
                    expand_property(item, &scoped)?
                };
                match expanded.get_mut(&key) {
                    None => {
                        expanded.insert(key, item);
                    }
                    Some(_) if value_is_keyword(&key) => bail!("colliding keywords for {key}"),
                    Some(existing) => merge_values(existing, item),
                }
            }
            if let Some(language) = &scoped.language {
                if map.contains_key(vocab::VALUE.as_str())
                    && !expanded.contains_key(vocab::TYPE.as_str())
                {
                    expanded
                        .entry(vocab::LANGUAGE.as_str().to_owned())
                        .or_insert_with(|| JsonValue::String(language.clone()));
                }
            }
            Ok(JsonValue::Object(expanded))
        }
        other => Ok(other.clone()),
    }
}

/// Expands the value of a property, tagging plain strings with the default
/// language.
fn expand_property(value: &JsonValue, active: &Context) -> Result<JsonValue> {
    match (value, &active.language) {
        (JsonValue::String(text), Some(language)) => Ok(json!({
            (vocab::VALUE.as_str()): text,
            (vocab::LANGUAGE.as_str()): language
        })),
        (JsonValue::Array(items), _) => Ok(JsonValue::Array(
            items
                .iter()
                .map(|item| expand_property(item, active))
                .collect::<Result<_>>()?,
        )),
        _ => expand_value(value, active),
    }
}

/// Keys expanding to the same IRI collect their values in one array.
fn merge_values(existing: &mut JsonValue, item: JsonValue) {
    let mut values = match existing.take() {
        JsonValue::Array(values) => values,
        single => vec![single],
    };
    match item {
        JsonValue::Array(items) => values.extend(items),
        single => values.push(single),
    }
    *existing = JsonValue::Array(values);
}

fn expand_type(value: &JsonValue, active: &Context) -> JsonValue {
    match value {
        JsonValue::String(ty) => {
            JsonValue::String(vocab::expand_xsd(&active.expand_iri(ty)).into())
        }
        JsonValue::Array(types) => JsonValue::Array(
            types
                .iter()
                .map(|ty| expand_type(ty, active))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn process_contexts(context_def: &JsonValue, result: &mut Context) -> Result<()> {
    // 4.1.2.4 Normalize context to an array
    let contexts = if context_def.is_array() {
        context_def
            .as_array()
            .context("context should either be a string, an object, or an array of them")?
            .to_owned()
    } else {
        vec![context_def.to_owned()]
    };

    for context in &contexts {
        match context {
            // 4.1.2.5.1 override
            JsonValue::Null => {
                *result = Context::default();
            }
            // 4.1.2.5.2
            JsonValue::String(remote_context) => {
                bail!("remote context {remote_context} is not supported, inline the definitions");
            }
            // 4.1.2.5.4
            JsonValue::Object(_) => {
                process_context_definition(context, result)?;
            }
            // 4.1.2.5.3
            _ => {
                bail!("invalid local context (not null, string, or map)");
            }
        }
    }
    Ok(())
}

fn process_context_definition(context: &JsonValue, result: &mut Context) -> Result<()> {
    let mut defined = BTreeMap::new();

    // 4.1.2.5.5
    match context.get("@version") {
        Some(JsonValue::Number(number)) => {
            if number.as_f64().unwrap_or_default() != 1.1 {
                bail!("invalid @version value {number}");
            }
        }
        Some(value) => {
            bail!("invalid @version value {value}");
        }
        None => {}
    }

    // 4.1.2.5.8
    match context.get("@vocab") {
        Some(JsonValue::Null) => {
            result.vocab = None;
        }
        Some(JsonValue::String(value)) => {
            result.vocab = Some(iri_expand(result, value, context, &mut defined)?);
        }
        Some(value) => bail!("invalid vocabulary mapping {value}"),
        None => {}
    }
    // 4.1.2.5.9
    match context.get("@language") {
        Some(JsonValue::Null) => {
            result.language = None;
        }
        Some(JsonValue::String(lang)) => {
            result.language = Some(lang.to_owned());
        }
        Some(value) => bail!("invalid default language {value}"),
        None => {}
    }

    // 4.1.2.5.13
    let entries = context.as_object().context("context should be a JSON object")?;
    for (key, value) in entries {
        if [
            "@base",
            "@direction",
            "@import",
            "@language",
            "@propagate",
            "@protected",
            "@version",
            "@vocab",
        ]
        .contains(&key.as_str())
        {
            continue;
        }
        create_term_definition(result, context, key, value, &mut defined)?;
    }

    Ok(())
}

fn create_term_definition(
    result: &mut Context,
    context: &JsonValue,
    term: &str,
    value: &JsonValue,
    defined: &mut BTreeMap<String, bool>,
) -> Result<()> {
    // 4.2.2.1
    match defined.get(term) {
        Some(true) => return Ok(()),
        Some(false) => bail!("cyclic IRI mapping found"),
        _ => {}
    }
    // 4.2.2.2
    if term.is_empty() {
        bail!("invalid term definition (empty string)");
    }
    defined.insert(term.to_owned(), false);

    // 4.2.2.5
    if term.starts_with('@') && term.is_ascii() {
        bail!("keyword redefinition error");
    }
    // 4.2.2.6
    result.term_map.remove(term);

    let value = match value {
        // 4.2.2.7
        JsonValue::Null => json!({ "@id": null }),
        // 4.2.2.8
        JsonValue::String(string) => json!({ "@id": string }),
        // 4.2.2.9
        JsonValue::Object(_) => value.clone(),
        _ => bail!("invalid term definition error"),
    };

    let mut definition = None;

    match value.get("@id") {
        // 4.2.2.14.1
        Some(JsonValue::Null) => {}
        Some(JsonValue::String(id)) => {
            // 4.2.2.14.2.2
            if id.starts_with('@') && !value_is_keyword(id) {
                bail!("invalid keyword alias");
            }
            // 4.2.2.14.2.3
            let expanded = iri_expand(result, id, context, defined)?;
            if expanded == CONTEXT {
                bail!("invalid keyword alias error (@context cannot be aliased)");
            }
            // 4.2.2.14.2.4
            if term.contains(':') || term.contains('/') {
                defined.insert(term.to_owned(), true);
                if expanded != iri_expand(result, term, context, defined)? {
                    bail!("invalid IRI mapping (term mismatch)");
                }
            }
            definition = Some(expanded);
        }
        // 4.2.2.14.2.1
        Some(_) => bail!("invalid IRI mapping error (entry is not a string)"),
        None => {
            // 4.2.2.15
            if let Some((term_prefix, suffix)) = term.split_once(':') {
                if !suffix.starts_with("//") {
                    if let Some(prefix_value) = context.get(term_prefix) {
                        create_term_definition(
                            result,
                            context,
                            term_prefix,
                            prefix_value,
                            defined,
                        )?;
                    }
                    definition = match result.get_term(term_prefix) {
                        Some(prefix) => prefix.join(suffix),
                        None => Some(Term::new_iri(term)),
                    };
                }
            // 4.2.2.16
            } else if term.contains('/') {
                definition = Some(iri_expand(result, term, context, defined)?);
            // 4.2.2.18
            } else if let Some(vocab) = &result.vocab {
                definition = vocab.join(term);
            }
        }
    }

    // 4.2.2.25
    if let Some(prefix) = value.get("@prefix") {
        match prefix {
            JsonValue::Bool(true) if definition.as_ref().is_some_and(Term::is_keyword) => {
                bail!("invalid term definition (keyword as prefix)");
            }
            JsonValue::Bool(_) => {}
            _ => bail!("invalid @prefix value"),
        }
    }

    let entries = value.as_object().context("term definition should be a JSON object")?;
    for entry in entries.keys() {
        if ![
            "@id",
            "@reverse",
            "@container",
            "@context",
            "@direction",
            "@index",
            "@language",
            "@nest",
            "@prefix",
            "@protected",
            "@type",
        ]
        .contains(&entry.as_str())
        {
            bail!("invalid term definition (unknown keyword {entry})");
        }
    }

    if let Some(definition) = definition {
        result.insert(term, definition);
    }
    defined.insert(term.to_owned(), true);

    Ok(())
}

fn iri_expand(
    active_context: &mut Context,
    value: &str,
    local_context: &JsonValue,
    defined: &mut BTreeMap<String, bool>,
) -> Result<Term> {
    // 5.2.2.1
    if value_is_keyword(value) {
        return Ok(Term::Keyword(value.to_owned().into()));
    }
    // 5.2.2.3
    if let Some(entry_value) = local_context.get(value) {
        if !defined.contains_key(value) {
            create_term_definition(active_context, local_context, value, entry_value, defined)?;
        }
    }
    // 5.2.2.4, 5.2.2.5
    if let Some(definition) = active_context.get_term(value) {
        return Ok(definition.clone());
    }
    if let Some((prefix, suffix)) = value.split_once(':') {
        // 5.2.2.6.2
        if suffix.starts_with("//") {
            return Ok(Term::new_iri(value));
        }
        // 5.2.2.6.3
        if let Some(prefix_value) = local_context.get(prefix) {
            if !matches!(defined.get(prefix), Some(true)) {
                create_term_definition(
                    active_context,
                    local_context,
                    prefix,
                    prefix_value,
                    defined,
                )?;
            }
        }
        // 5.2.2.6.4
        if let Some(expanded) = active_context.get_term(prefix).and_then(|t| t.join(suffix)) {
            return Ok(expanded);
        }
        // 5.2.2.6.5
        return Ok(Term::new_iri(value));
    }
    // 5.2.2.7
    if let Some(expanded) = active_context.vocab.as_ref().and_then(|v| v.join(value)) {
        return Ok(expanded);
    }

    Ok(Term::new_iri(value))
}

fn value_is_keyword(value: &str) -> bool {
    [
        "@base",
        "@container",
        "@context",
        "@direction",
        "@graph",
        "@id",
        "@import",
        "@include",
        "@index",
        "@json",
        "@language",
        "@list",
        "@nest",
        "@none",
        "@prefix",
        "@propagate",
        "@protected",
        "@reverse",
        "@set",
        "@type",
        "@value",
        "@version",
        "@vocab",
    ]
    .contains(&value)
}
