//! Scalar and aggregate functions.
//!
//! `DateFormat` and `Now` depend on the session: their zone, locale and clock
//! are taken from the reading stream's configuration and are never written.

use std::io::Write;

use planwire_common::config::SessionConfiguration;
use planwire_common::error::Result;

use super::Expression;
use crate::registry::{NamedWriteable, category_factory};
use crate::source::Source;
use crate::stream::{PlanStreamInput, PlanStreamOutput};

fn read_child(input: &mut PlanStreamInput<'_>) -> Result<Box<Expression>> {
    input.read_named_writeable().map(Box::new)
}

fn read_optional_child(input: &mut PlanStreamInput<'_>) -> Result<Option<Box<Expression>>> {
    Ok(input.read_optional_named_writeable()?.map(Box::new))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarFunction {
    Length {
        source: Source,
        field: Box<Expression>,
    },
    ToUpper {
        source: Source,
        field: Box<Expression>,
    },
    ToLower {
        source: Source,
        field: Box<Expression>,
    },
    Concat {
        source: Source,
        first: Box<Expression>,
        rest: Vec<Expression>,
    },
    Abs {
        source: Source,
        field: Box<Expression>,
    },
    Round {
        source: Source,
        field: Box<Expression>,
        decimals: Option<Box<Expression>>,
    },
    DateFormat {
        source: Source,
        field: Box<Expression>,
        format: Option<Box<Expression>>,
        zone_id: String,
        locale: String,
    },
    Now {
        source: Source,
        now_millis: i64,
        zone_id: String,
    },
}

impl ScalarFunction {
    /// A `DateFormat` bound to the session's zone and locale.
    pub fn date_format(
        source: Source,
        field: Expression,
        format: Option<Expression>,
        configuration: &SessionConfiguration,
    ) -> Self {
        ScalarFunction::DateFormat {
            source,
            field: Box::new(field),
            format: format.map(Box::new),
            zone_id: configuration.zone_id().to_string(),
            locale: configuration.locale().to_string(),
        }
    }

    /// A `Now` frozen at the session's clock.
    pub fn now(source: Source, configuration: &SessionConfiguration) -> Self {
        ScalarFunction::Now {
            source,
            now_millis: configuration.now_millis(),
            zone_id: configuration.zone_id().to_string(),
        }
    }

    pub fn source(&self) -> &Source {
        match self {
            ScalarFunction::Length { source, .. }
            | ScalarFunction::ToUpper { source, .. }
            | ScalarFunction::ToLower { source, .. }
            | ScalarFunction::Concat { source, .. }
            | ScalarFunction::Abs { source, .. }
            | ScalarFunction::Round { source, .. }
            | ScalarFunction::DateFormat { source, .. }
            | ScalarFunction::Now { source, .. } => source,
        }
    }

    pub fn children(&self) -> Vec<&Expression> {
        match self {
            ScalarFunction::Length { field, .. }
            | ScalarFunction::ToUpper { field, .. }
            | ScalarFunction::ToLower { field, .. }
            | ScalarFunction::Abs { field, .. } => vec![field.as_ref()],
            ScalarFunction::Concat { first, rest, .. } => {
                std::iter::once(first.as_ref()).chain(rest.iter()).collect()
            }
            ScalarFunction::Round {
                field, decimals, ..
            } => std::iter::once(field.as_ref())
                .chain(decimals.as_deref())
                .collect(),
            ScalarFunction::DateFormat { field, format, .. } => std::iter::once(field.as_ref())
                .chain(format.as_deref())
                .collect(),
            ScalarFunction::Now { .. } => Vec::new(),
        }
    }

    pub(crate) fn read_length(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(ScalarFunction::Length {
            source: input.read_source()?,
            field: read_child(input)?,
        })
    }

    pub(crate) fn read_to_upper(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(ScalarFunction::ToUpper {
            source: input.read_source()?,
            field: read_child(input)?,
        })
    }

    pub(crate) fn read_to_lower(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(ScalarFunction::ToLower {
            source: input.read_source()?,
            field: read_child(input)?,
        })
    }

    pub(crate) fn read_concat(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(ScalarFunction::Concat {
            source: input.read_source()?,
            first: read_child(input)?,
            rest: input.read_named_writeable_collection()?,
        })
    }

    pub(crate) fn read_abs(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(ScalarFunction::Abs {
            source: input.read_source()?,
            field: read_child(input)?,
        })
    }

    pub(crate) fn read_round(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(ScalarFunction::Round {
            source: input.read_source()?,
            field: read_child(input)?,
            decimals: read_optional_child(input)?,
        })
    }

    pub(crate) fn read_date_format(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        let source = input.read_source()?;
        let field = read_child(input)?;
        let format = read_optional_child(input)?;
        let configuration = input.configuration();
        Ok(ScalarFunction::DateFormat {
            source,
            field,
            format,
            zone_id: configuration.zone_id().to_string(),
            locale: configuration.locale().to_string(),
        })
    }

    pub(crate) fn read_now(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        let source = input.read_source()?;
        let configuration = input.configuration();
        Ok(ScalarFunction::Now {
            source,
            now_millis: configuration.now_millis(),
            zone_id: configuration.zone_id().to_string(),
        })
    }
}

impl NamedWriteable for ScalarFunction {
    category_factory!(ScalarFunction);

    fn writeable_name(&self) -> &'static str {
        match self {
            ScalarFunction::Length { .. } => "Length",
            ScalarFunction::ToUpper { .. } => "ToUpper",
            ScalarFunction::ToLower { .. } => "ToLower",
            ScalarFunction::Concat { .. } => "Concat",
            ScalarFunction::Abs { .. } => "Abs",
            ScalarFunction::Round { .. } => "Round",
            ScalarFunction::DateFormat { .. } => "DateFormat",
            ScalarFunction::Now { .. } => "Now",
        }
    }

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(self.source())?;
        match self {
            ScalarFunction::Length { field, .. }
            | ScalarFunction::ToUpper { field, .. }
            | ScalarFunction::ToLower { field, .. }
            | ScalarFunction::Abs { field, .. } => out.write_named_writeable(field.as_ref()),
            ScalarFunction::Concat { first, rest, .. } => {
                out.write_named_writeable(first.as_ref())?;
                out.write_named_writeable_collection(rest)
            }
            ScalarFunction::Round {
                field, decimals, ..
            } => {
                out.write_named_writeable(field.as_ref())?;
                out.write_optional_named_writeable(decimals.as_deref())
            }
            ScalarFunction::DateFormat { field, format, .. } => {
                out.write_named_writeable(field.as_ref())?;
                out.write_optional_named_writeable(format.as_deref())
            }
            ScalarFunction::Now { .. } => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count {
        source: Source,
        field: Box<Expression>,
    },
    CountDistinct {
        source: Source,
        field: Box<Expression>,
        precision: Option<Box<Expression>>,
    },
    Sum {
        source: Source,
        field: Box<Expression>,
    },
    Min {
        source: Source,
        field: Box<Expression>,
    },
    Max {
        source: Source,
        field: Box<Expression>,
    },
    Avg {
        source: Source,
        field: Box<Expression>,
    },
}

impl AggregateFunction {
    pub fn source(&self) -> &Source {
        match self {
            AggregateFunction::Count { source, .. }
            | AggregateFunction::CountDistinct { source, .. }
            | AggregateFunction::Sum { source, .. }
            | AggregateFunction::Min { source, .. }
            | AggregateFunction::Max { source, .. }
            | AggregateFunction::Avg { source, .. } => source,
        }
    }

    pub fn field(&self) -> &Expression {
        match self {
            AggregateFunction::Count { field, .. }
            | AggregateFunction::CountDistinct { field, .. }
            | AggregateFunction::Sum { field, .. }
            | AggregateFunction::Min { field, .. }
            | AggregateFunction::Max { field, .. }
            | AggregateFunction::Avg { field, .. } => field.as_ref(),
        }
    }

    pub fn children(&self) -> Vec<&Expression> {
        match self {
            AggregateFunction::CountDistinct {
                field, precision, ..
            } => std::iter::once(field.as_ref())
                .chain(precision.as_deref())
                .collect(),
            other => vec![other.field()],
        }
    }

    pub(crate) fn read_count(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(AggregateFunction::Count {
            source: input.read_source()?,
            field: read_child(input)?,
        })
    }

    pub(crate) fn read_count_distinct(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(AggregateFunction::CountDistinct {
            source: input.read_source()?,
            field: read_child(input)?,
            precision: read_optional_child(input)?,
        })
    }

    pub(crate) fn read_sum(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(AggregateFunction::Sum {
            source: input.read_source()?,
            field: read_child(input)?,
        })
    }

    pub(crate) fn read_min(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(AggregateFunction::Min {
            source: input.read_source()?,
            field: read_child(input)?,
        })
    }

    pub(crate) fn read_max(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(AggregateFunction::Max {
            source: input.read_source()?,
            field: read_child(input)?,
        })
    }

    pub(crate) fn read_avg(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(AggregateFunction::Avg {
            source: input.read_source()?,
            field: read_child(input)?,
        })
    }
}

impl NamedWriteable for AggregateFunction {
    category_factory!(AggregateFunction);

    fn writeable_name(&self) -> &'static str {
        match self {
            AggregateFunction::Count { .. } => "Count",
            AggregateFunction::CountDistinct { .. } => "CountDistinct",
            AggregateFunction::Sum { .. } => "Sum",
            AggregateFunction::Min { .. } => "Min",
            AggregateFunction::Max { .. } => "Max",
            AggregateFunction::Avg { .. } => "Avg",
        }
    }

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(self.source())?;
        out.write_named_writeable(self.field())?;
        if let AggregateFunction::CountDistinct { precision, .. } = self {
            out.write_optional_named_writeable(precision.as_deref())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::default_registries;
    use crate::literal::Literal;

    fn config(zone_id: &str, now_millis: i64) -> SessionConfiguration {
        SessionConfiguration::builder()
            .zone_id(zone_id)
            .now_millis(now_millis)
            .build()
            .unwrap()
    }

    fn round_trip(
        function: &ScalarFunction,
        write: &SessionConfiguration,
        read: &SessionConfiguration,
    ) -> ScalarFunction {
        let (registry, plan_registry) = default_registries().unwrap();
        let mut out = PlanStreamOutput::new(&registry, &plan_registry, write);
        out.write_named_writeable(function).unwrap();
        let mut input = PlanStreamInput::new(out.bytes().to_vec(), &registry, &plan_registry, read);
        let copy = input.read_named_writeable().unwrap();
        input.finish().unwrap();
        copy
    }

    #[test]
    fn test_now_takes_clock_from_reader() {
        let writer = config("UTC", 1_700_000_000_000);
        let now = ScalarFunction::now(Source::EMPTY, &writer);
        assert_eq!(round_trip(&now, &writer, &writer), now);

        let reader = config("Europe/Paris", 42);
        match round_trip(&now, &writer, &reader) {
            ScalarFunction::Now {
                now_millis,
                zone_id,
                ..
            } => {
                assert_eq!(now_millis, 42);
                assert_eq!(zone_id, "Europe/Paris");
            }
            other => panic!("unexpected function {:?}", other),
        }
    }

    #[test]
    fn test_date_format_keeps_children() {
        let cfg = config("UTC", 0);
        let function = ScalarFunction::date_format(
            Source::EMPTY,
            Literal::of(Source::EMPTY, 1_700_000_000_000i64).into(),
            Some(Literal::of(Source::EMPTY, "yyyy-MM-dd").into()),
            &cfg,
        );
        let copy = round_trip(&function, &cfg, &cfg);
        assert_eq!(copy, function);
        assert_eq!(copy.children().len(), 2);
    }
}
