use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Term {
    Iri(Cow<'static, str>),
    Keyword(Cow<'static, str>),
}

impl Default for Term {
    fn default() -> Self {
        Term::Iri(Cow::default())
    }
}

impl Term {
    pub(crate) const fn const_keyword(keyword: &'static str) -> Term {
        Term::Keyword(Cow::Borrowed(keyword))
    }

    pub(crate) fn new_iri(iri: &str) -> Term {
        Term::Iri(Cow::Owned(iri.to_owned()))
    }

    pub(crate) const fn const_iri(iri: &'static str) -> Term {
        Term::Iri(Cow::Borrowed(iri))
    }

    pub(crate) fn as_str(&self) -> &str {
        match self {
            Term::Iri(iri) => iri,
            Term::Keyword(keyword) => keyword,
        }
    }

    pub(crate) fn is_keyword(&self) -> bool {
        matches!(self, Term::Keyword(_))
    }

    /// Appends a suffix to an IRI, keywords have no suffixes.
    pub(crate) fn join(&self, suffix: &str) -> Option<Term> {
        match self {
            Term::Iri(iri) => Some(Term::Iri(Cow::Owned(format!("{iri}{suffix}")))),
            Term::Keyword(_) => None,
        }
    }
}

pub(crate) const CONTEXT: Term = Term::const_keyword("@context");
pub(crate) const ID: Term = Term::const_keyword("@id");
pub(crate) const TYPE: Term = Term::const_keyword("@type");
pub(crate) const VALUE: Term = Term::const_keyword("@value");
pub(crate) const LANGUAGE: Term = Term::const_keyword("@language");

pub(crate) const RDFS_LABEL: Term = Term::const_iri("http://www.w3.org/2000/01/rdf-schema#label");

pub(crate) const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub(crate) const XSD_STRING: Term = Term::const_iri("http://www.w3.org/2001/XMLSchema#string");
pub(crate) const XSD_BOOLEAN: Term = Term::const_iri("http://www.w3.org/2001/XMLSchema#boolean");
pub(crate) const XSD_INTEGER: Term = Term::const_iri("http://www.w3.org/2001/XMLSchema#integer");
pub(crate) const XSD_DECIMAL: Term = Term::const_iri("http://www.w3.org/2001/XMLSchema#decimal");
pub(crate) const XSD_DOUBLE: Term = Term::const_iri("http://www.w3.org/2001/XMLSchema#double");
pub(crate) const XSD_FLOAT: Term = Term::const_iri("http://www.w3.org/2001/XMLSchema#float");
pub(crate) const XSD_DATE: Term = Term::const_iri("http://www.w3.org/2001/XMLSchema#date");
pub(crate) const XSD_DATE_TIME: Term = Term::const_iri("http://www.w3.org/2001/XMLSchema#dateTime");

/// Expands the `xsd:` prefix, leaving absolute IRIs untouched.
pub(crate) fn expand_xsd(datatype: &str) -> Cow<'_, str> {
    match datatype.strip_prefix("xsd:") {
        Some(local) => Cow::Owned(format!("{XSD_NS}{local}")),
        None => Cow::Borrowed(datatype),
    }
}
