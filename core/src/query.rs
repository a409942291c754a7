//! Search query builders pushed down to the data source.
//!
//! Every variant is a [`NamedWriteable`] of [`Category::QueryBuilder`](crate::registry::Category).

use std::io::Write;

use planwire_common::error::Result;

use crate::literal::LiteralValue;
use crate::registry::{NamedWriteable, category_factory};
use crate::source::Source;
use crate::stream::{PlanStreamInput, PlanStreamOutput};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryBuilder {
    Term {
        field: String,
        value: LiteralValue,
        case_insensitive: bool,
    },
    Terms {
        field: String,
        values: Vec<LiteralValue>,
    },
    MatchAll,
    Range {
        field: String,
        from: Option<LiteralValue>,
        to: Option<LiteralValue>,
        include_lower: bool,
        include_upper: bool,
        format: Option<String>,
        time_zone: Option<String>,
    },
    Bool {
        must: Vec<QueryBuilder>,
        filter: Vec<QueryBuilder>,
        should: Vec<QueryBuilder>,
        must_not: Vec<QueryBuilder>,
        minimum_should_match: Option<String>,
    },
    Wildcard {
        field: String,
        pattern: String,
        case_insensitive: bool,
    },
    Regexp {
        field: String,
        pattern: String,
        flags: u32,
        case_insensitive: bool,
    },
    Exists {
        field: String,
    },
    /// Matches documents where `field` holds exactly one value and `next` matches.
    SingleValue {
        next: Box<QueryBuilder>,
        field: String,
        source: Source,
    },
}

impl QueryBuilder {
    pub fn term<F: Into<String>, V: Into<LiteralValue>>(field: F, value: V) -> Self {
        QueryBuilder::Term {
            field: field.into(),
            value: value.into(),
            case_insensitive: false,
        }
    }

    pub fn exists<F: Into<String>>(field: F) -> Self {
        QueryBuilder::Exists {
            field: field.into(),
        }
    }

    /// A bool query with only `filter` clauses.
    pub fn filter(clauses: Vec<QueryBuilder>) -> Self {
        QueryBuilder::Bool {
            must: Vec::new(),
            filter: clauses,
            should: Vec::new(),
            must_not: Vec::new(),
            minimum_should_match: None,
        }
    }

    pub(crate) fn read_term(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(QueryBuilder::Term {
            field: input.read_string()?,
            value: input.read_literal_value()?,
            case_insensitive: input.read_bool()?,
        })
    }

    pub(crate) fn read_terms(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(QueryBuilder::Terms {
            field: input.read_string()?,
            values: input.read_collection(|input| input.read_literal_value())?,
        })
    }

    pub(crate) fn read_match_all(_input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(QueryBuilder::MatchAll)
    }

    pub(crate) fn read_range(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(QueryBuilder::Range {
            field: input.read_string()?,
            from: input.read_optional_literal_value()?,
            to: input.read_optional_literal_value()?,
            include_lower: input.read_bool()?,
            include_upper: input.read_bool()?,
            format: input.read_optional_string()?,
            time_zone: input.read_optional_string()?,
        })
    }

    pub(crate) fn read_bool(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(QueryBuilder::Bool {
            must: input.read_named_writeable_collection()?,
            filter: input.read_named_writeable_collection()?,
            should: input.read_named_writeable_collection()?,
            must_not: input.read_named_writeable_collection()?,
            minimum_should_match: input.read_optional_string()?,
        })
    }

    pub(crate) fn read_wildcard(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(QueryBuilder::Wildcard {
            field: input.read_string()?,
            pattern: input.read_string()?,
            case_insensitive: input.read_bool()?,
        })
    }

    pub(crate) fn read_regexp(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(QueryBuilder::Regexp {
            field: input.read_string()?,
            pattern: input.read_string()?,
            flags: input.read_vu32()?,
            case_insensitive: input.read_bool()?,
        })
    }

    pub(crate) fn read_exists(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(QueryBuilder::Exists {
            field: input.read_string()?,
        })
    }

    pub(crate) fn read_single_value(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(QueryBuilder::SingleValue {
            next: Box::new(input.read_named_writeable()?),
            field: input.read_string()?,
            source: input.read_source()?,
        })
    }
}

impl NamedWriteable for QueryBuilder {
    category_factory!(QueryBuilder);

    fn writeable_name(&self) -> &'static str {
        match self {
            QueryBuilder::Term { .. } => "Term",
            QueryBuilder::Terms { .. } => "Terms",
            QueryBuilder::MatchAll => "MatchAll",
            QueryBuilder::Range { .. } => "Range",
            QueryBuilder::Bool { .. } => "Bool",
            QueryBuilder::Wildcard { .. } => "Wildcard",
            QueryBuilder::Regexp { .. } => "Regexp",
            QueryBuilder::Exists { .. } => "Exists",
            QueryBuilder::SingleValue { .. } => "SingleValue",
        }
    }

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        match self {
            QueryBuilder::Term {
                field,
                value,
                case_insensitive,
            } => {
                out.write_string(field)?;
                out.write_literal_value(value)?;
                out.write_bool(*case_insensitive)
            }
            QueryBuilder::Terms { field, values } => {
                out.write_string(field)?;
                out.write_collection(values, |out, v| out.write_literal_value(v))
            }
            QueryBuilder::MatchAll => Ok(()),
            QueryBuilder::Range {
                field,
                from,
                to,
                include_lower,
                include_upper,
                format,
                time_zone,
            } => {
                out.write_string(field)?;
                out.write_optional_literal_value(from.as_ref())?;
                out.write_optional_literal_value(to.as_ref())?;
                out.write_bool(*include_lower)?;
                out.write_bool(*include_upper)?;
                out.write_optional_string(format.as_deref())?;
                out.write_optional_string(time_zone.as_deref())
            }
            QueryBuilder::Bool {
                must,
                filter,
                should,
                must_not,
                minimum_should_match,
            } => {
                out.write_named_writeable_collection(must)?;
                out.write_named_writeable_collection(filter)?;
                out.write_named_writeable_collection(should)?;
                out.write_named_writeable_collection(must_not)?;
                out.write_optional_string(minimum_should_match.as_deref())
            }
            QueryBuilder::Wildcard {
                field,
                pattern,
                case_insensitive,
            } => {
                out.write_string(field)?;
                out.write_string(pattern)?;
                out.write_bool(*case_insensitive)
            }
            QueryBuilder::Regexp {
                field,
                pattern,
                flags,
                case_insensitive,
            } => {
                out.write_string(field)?;
                out.write_string(pattern)?;
                out.write_vu32(*flags)?;
                out.write_bool(*case_insensitive)
            }
            QueryBuilder::Exists { field } => out.write_string(field),
            QueryBuilder::SingleValue {
                next,
                field,
                source,
            } => {
                out.write_named_writeable(next.as_ref())?;
                out.write_string(field)?;
                out.write_source(source)
            }
        }
    }
}
