//! Attributes: references to columns produced by a plan.

use std::io::Write;

use planwire_common::error::Result;

use super::NameId;
use crate::registry::{NamedWriteable, NodeBody, category_factory};
use crate::source::Source;
use crate::stream::{PlanStreamInput, PlanStreamOutput};
use crate::types::DataType;

/// Mapping of a field in the data source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EsField {
    pub name: String,
    pub data_type: DataType,
    pub aggregatable: bool,
}

impl EsField {
    pub fn new<S: Into<String>>(name: S, data_type: DataType, aggregatable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            aggregatable,
        }
    }

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_string(&self.name)?;
        out.write_enum(self.data_type)?;
        out.write_bool(self.aggregatable)
    }

    fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            name: input.read_string()?,
            data_type: input.read_enum("data type")?,
            aggregatable: input.read_bool()?,
        })
    }
}

/// An attribute backed by a field of the data source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldAttribute {
    pub source: Source,
    pub parent_name: Option<String>,
    pub name: String,
    pub field: EsField,
    pub nullable: bool,
    pub id: NameId,
    pub synthetic: bool,
}

/// An attribute pointing at a value computed earlier in the plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceAttribute {
    pub source: Source,
    pub name: String,
    pub data_type: DataType,
    pub qualifier: Option<String>,
    pub nullable: bool,
    pub id: NameId,
    pub synthetic: bool,
}

/// Document metadata such as `_index` or `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataAttribute {
    pub source: Source,
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub id: NameId,
    pub searchable: bool,
}

/// A field whose mapped type the engine cannot process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnsupportedAttribute {
    pub source: Source,
    pub name: String,
    pub original_type: String,
    pub message: Option<String>,
    pub id: NameId,
}

impl FieldAttribute {
    pub const NAME: &'static str = "FieldAttribute";

    pub fn new<S: Into<String>>(source: Source, name: S, field: EsField, id: NameId) -> Self {
        Self {
            source,
            parent_name: None,
            name: name.into(),
            field,
            nullable: true,
            id,
            synthetic: false,
        }
    }

    pub(crate) fn write_body<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_optional_string(self.parent_name.as_deref())?;
        out.write_string(&self.name)?;
        self.field.write_to(out)?;
        out.write_bool(self.nullable)?;
        out.write_vu64(self.id.0)?;
        out.write_bool(self.synthetic)
    }
}

impl NodeBody for FieldAttribute {
    fn read_body(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            parent_name: input.read_optional_string()?,
            name: input.read_string()?,
            field: EsField::read_from(input)?,
            nullable: input.read_bool()?,
            id: NameId(input.read_vu64()?),
            synthetic: input.read_bool()?,
        })
    }
}

impl ReferenceAttribute {
    pub const NAME: &'static str = "ReferenceAttribute";

    pub fn new<S: Into<String>>(source: Source, name: S, data_type: DataType, id: NameId) -> Self {
        Self {
            source,
            name: name.into(),
            data_type,
            qualifier: None,
            nullable: true,
            id,
            synthetic: false,
        }
    }

    pub(crate) fn write_body<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_string(&self.name)?;
        out.write_enum(self.data_type)?;
        out.write_optional_string(self.qualifier.as_deref())?;
        out.write_bool(self.nullable)?;
        out.write_vu64(self.id.0)?;
        out.write_bool(self.synthetic)
    }
}

impl NodeBody for ReferenceAttribute {
    fn read_body(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            name: input.read_string()?,
            data_type: input.read_enum("data type")?,
            qualifier: input.read_optional_string()?,
            nullable: input.read_bool()?,
            id: NameId(input.read_vu64()?),
            synthetic: input.read_bool()?,
        })
    }
}

impl MetadataAttribute {
    pub const NAME: &'static str = "MetadataAttribute";

    pub fn new<S: Into<String>>(
        source: Source,
        name: S,
        data_type: DataType,
        searchable: bool,
        id: NameId,
    ) -> Self {
        Self {
            source,
            name: name.into(),
            data_type,
            nullable: false,
            id,
            searchable,
        }
    }

    pub(crate) fn write_body<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_string(&self.name)?;
        out.write_enum(self.data_type)?;
        out.write_bool(self.nullable)?;
        out.write_vu64(self.id.0)?;
        out.write_bool(self.searchable)
    }
}

impl NodeBody for MetadataAttribute {
    fn read_body(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            name: input.read_string()?,
            data_type: input.read_enum("data type")?,
            nullable: input.read_bool()?,
            id: NameId(input.read_vu64()?),
            searchable: input.read_bool()?,
        })
    }
}

impl UnsupportedAttribute {
    pub const NAME: &'static str = "UnsupportedAttribute";

    pub fn new<S: Into<String>, T: Into<String>>(
        source: Source,
        name: S,
        original_type: T,
        id: NameId,
    ) -> Self {
        Self {
            source,
            name: name.into(),
            original_type: original_type.into(),
            message: None,
            id,
        }
    }

    pub(crate) fn write_body<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_string(&self.name)?;
        out.write_string(&self.original_type)?;
        out.write_optional_string(self.message.as_deref())?;
        out.write_vu64(self.id.0)
    }
}

impl NodeBody for UnsupportedAttribute {
    fn read_body(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            name: input.read_string()?,
            original_type: input.read_string()?,
            message: input.read_optional_string()?,
            id: NameId(input.read_vu64()?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attribute {
    Field(FieldAttribute),
    Reference(ReferenceAttribute),
    Metadata(MetadataAttribute),
    Unsupported(UnsupportedAttribute),
}

impl Attribute {
    pub fn name(&self) -> &str {
        match self {
            Attribute::Field(a) => &a.name,
            Attribute::Reference(a) => &a.name,
            Attribute::Metadata(a) => &a.name,
            Attribute::Unsupported(a) => &a.name,
        }
    }

    pub fn id(&self) -> NameId {
        match self {
            Attribute::Field(a) => a.id,
            Attribute::Reference(a) => a.id,
            Attribute::Metadata(a) => a.id,
            Attribute::Unsupported(a) => a.id,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Attribute::Field(a) => a.field.data_type,
            Attribute::Reference(a) => a.data_type,
            Attribute::Metadata(a) => a.data_type,
            Attribute::Unsupported(_) => DataType::Unsupported,
        }
    }

    pub fn source(&self) -> &Source {
        match self {
            Attribute::Field(a) => &a.source,
            Attribute::Reference(a) => &a.source,
            Attribute::Metadata(a) => &a.source,
            Attribute::Unsupported(a) => &a.source,
        }
    }
}

impl From<FieldAttribute> for Attribute {
    fn from(value: FieldAttribute) -> Self {
        Attribute::Field(value)
    }
}

impl From<ReferenceAttribute> for Attribute {
    fn from(value: ReferenceAttribute) -> Self {
        Attribute::Reference(value)
    }
}

impl From<MetadataAttribute> for Attribute {
    fn from(value: MetadataAttribute) -> Self {
        Attribute::Metadata(value)
    }
}

impl From<UnsupportedAttribute> for Attribute {
    fn from(value: UnsupportedAttribute) -> Self {
        Attribute::Unsupported(value)
    }
}

impl NamedWriteable for Attribute {
    category_factory!(Attribute);

    fn writeable_name(&self) -> &'static str {
        match self {
            Attribute::Field(_) => FieldAttribute::NAME,
            Attribute::Reference(_) => ReferenceAttribute::NAME,
            Attribute::Metadata(_) => MetadataAttribute::NAME,
            Attribute::Unsupported(_) => UnsupportedAttribute::NAME,
        }
    }

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        match self {
            Attribute::Field(a) => a.write_body(out),
            Attribute::Reference(a) => a.write_body(out),
            Attribute::Metadata(a) => a.write_body(out),
            Attribute::Unsupported(a) => a.write_body(out),
        }
    }
}
