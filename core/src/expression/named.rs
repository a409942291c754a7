use std::io::Write;

use planwire_common::error::Result;

use super::{Attribute, Expression, NameId};
use crate::registry::{NamedWriteable, NodeBody, category_factory};
use crate::source::Source;
use crate::stream::{PlanStreamInput, PlanStreamOutput};

/// Gives a computed expression a name so later nodes can reference it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alias {
    pub source: Source,
    pub name: String,
    pub qualifier: Option<String>,
    pub child: Box<Expression>,
    pub id: NameId,
    pub synthetic: bool,
}

impl Alias {
    pub const NAME: &'static str = "Alias";

    pub fn new<S: Into<String>>(source: Source, name: S, child: Expression, id: NameId) -> Self {
        Self {
            source,
            name: name.into(),
            qualifier: None,
            child: Box::new(child),
            id,
            synthetic: false,
        }
    }

    pub(crate) fn write_body<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_string(&self.name)?;
        out.write_optional_string(self.qualifier.as_deref())?;
        out.write_named_writeable(self.child.as_ref())?;
        out.write_vu64(self.id.0)?;
        out.write_bool(self.synthetic)
    }
}

impl NodeBody for Alias {
    fn read_body(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            name: input.read_string()?,
            qualifier: input.read_optional_string()?,
            child: Box::new(input.read_named_writeable()?),
            id: NameId(input.read_vu64()?),
            synthetic: input.read_bool()?,
        })
    }
}

/// An expression that produces a named output column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamedExpression {
    Attribute(Attribute),
    Alias(Alias),
}

impl NamedExpression {
    pub fn name(&self) -> &str {
        match self {
            NamedExpression::Attribute(a) => a.name(),
            NamedExpression::Alias(a) => &a.name,
        }
    }

    pub fn id(&self) -> NameId {
        match self {
            NamedExpression::Attribute(a) => a.id(),
            NamedExpression::Alias(a) => a.id,
        }
    }
}

impl From<Attribute> for NamedExpression {
    fn from(value: Attribute) -> Self {
        NamedExpression::Attribute(value)
    }
}

impl From<Alias> for NamedExpression {
    fn from(value: Alias) -> Self {
        NamedExpression::Alias(value)
    }
}

impl NamedWriteable for NamedExpression {
    category_factory!(NamedExpression);

    fn writeable_name(&self) -> &'static str {
        match self {
            NamedExpression::Attribute(a) => a.writeable_name(),
            NamedExpression::Alias(_) => Alias::NAME,
        }
    }

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        match self {
            NamedExpression::Attribute(a) => a.write_to(out),
            NamedExpression::Alias(a) => a.write_body(out),
        }
    }
}
