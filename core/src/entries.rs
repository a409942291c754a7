//! The built-in registration lists.
//!
//! Adding an encodable kind means adding its entry here; nothing is
//! discovered at runtime.

use planwire_common::error::Result;

use crate::expression::{
    AggregateFunction, Alias, Attribute, BinaryComparison, BinaryLogic, ComparisonOperator,
    Expression, FieldAttribute, IsNotNull, IsNull, LogicOperator, MetadataAttribute,
    NamedExpression, Not, ReferenceAttribute, ScalarFunction, UnsupportedAttribute,
};
use crate::literal::Literal;
use crate::logical_plan::{Aggregate, EsRelation, Filter, Limit, OrderBy, Project};
use crate::physical_plan::{
    AggregateExec, EsQueryExec, ExchangeExec, FilterExec, FragmentExec, LimitExec, ProjectExec,
    TopNExec,
};
use crate::plan_registry::{PlanEntry, PlanNameRegistry};
use crate::query::QueryBuilder;
use crate::registry::{Entry, NamedWriteableRegistry, read_as};

/// An attribute is readable wherever an attribute, a named expression or an
/// expression is expected.
macro_rules! attribute_entries {
    ($($ty:ident),* $(,)?) => {
        [
            $(
                Entry::new::<Attribute>($ty::NAME, read_as::<$ty, Attribute>),
                Entry::new::<NamedExpression>($ty::NAME, read_as::<$ty, NamedExpression>),
                Entry::new::<Expression>($ty::NAME, read_as::<$ty, Expression>),
            )*
        ]
    };
}

/// A function is registered in its own category and as an expression.
macro_rules! function_entries {
    ($category:ident => $variant:ident { $($name:literal => $reader:ident),* $(,)? }) => {
        [
            $(
                Entry::new::<$category>($name, $category::$reader),
                Entry::new::<Expression>($name, |input| {
                    $category::$reader(input).map(Expression::$variant)
                }),
            )*
        ]
    };
}

macro_rules! comparison_entries {
    ($($op:ident),* $(,)?) => {
        [
            $(
                Entry::new::<Expression>(ComparisonOperator::$op.name(), |input| {
                    BinaryComparison::read_body(input, ComparisonOperator::$op)
                        .map(Expression::Comparison)
                }),
            )*
        ]
    };
}

fn query_builder_entries() -> Vec<Entry> {
    vec![
        Entry::new::<QueryBuilder>("Term", QueryBuilder::read_term),
        Entry::new::<QueryBuilder>("Terms", QueryBuilder::read_terms),
        Entry::new::<QueryBuilder>("MatchAll", QueryBuilder::read_match_all),
        Entry::new::<QueryBuilder>("Range", QueryBuilder::read_range),
        Entry::new::<QueryBuilder>("Bool", QueryBuilder::read_bool),
        Entry::new::<QueryBuilder>("Wildcard", QueryBuilder::read_wildcard),
        Entry::new::<QueryBuilder>("Regexp", QueryBuilder::read_regexp),
        Entry::new::<QueryBuilder>("Exists", QueryBuilder::read_exists),
        Entry::new::<QueryBuilder>("SingleValue", QueryBuilder::read_single_value),
    ]
}

fn expression_entries() -> Vec<Entry> {
    let mut entries = vec![
        Entry::new::<NamedExpression>(Alias::NAME, read_as::<Alias, NamedExpression>),
        Entry::new::<Expression>(Alias::NAME, read_as::<Alias, Expression>),
        Entry::new::<Expression>("Literal", read_as::<Literal, Expression>),
        Entry::new::<Expression>(LogicOperator::And.name(), |input| {
            BinaryLogic::read_body(input, LogicOperator::And).map(Expression::Logic)
        }),
        Entry::new::<Expression>(LogicOperator::Or.name(), |input| {
            BinaryLogic::read_body(input, LogicOperator::Or).map(Expression::Logic)
        }),
        Entry::new::<Expression>("Not", read_as::<Not, Expression>),
        Entry::new::<Expression>("IsNull", read_as::<IsNull, Expression>),
        Entry::new::<Expression>("IsNotNull", read_as::<IsNotNull, Expression>),
    ];
    entries.extend(attribute_entries!(
        FieldAttribute,
        ReferenceAttribute,
        MetadataAttribute,
        UnsupportedAttribute,
    ));
    entries.extend(comparison_entries!(
        Equals,
        NotEquals,
        GreaterThan,
        GreaterThanOrEqual,
        LessThan,
        LessThanOrEqual,
    ));
    entries
}

fn function_entries() -> Vec<Entry> {
    let mut entries = Vec::new();
    entries.extend(function_entries!(ScalarFunction => Scalar {
        "Length" => read_length,
        "ToUpper" => read_to_upper,
        "ToLower" => read_to_lower,
        "Concat" => read_concat,
        "Abs" => read_abs,
        "Round" => read_round,
        "DateFormat" => read_date_format,
        "Now" => read_now,
    }));
    entries.extend(function_entries!(AggregateFunction => Aggregate {
        "Count" => read_count,
        "CountDistinct" => read_count_distinct,
        "Sum" => read_sum,
        "Min" => read_min,
        "Max" => read_max,
        "Avg" => read_avg,
    }));
    entries
}

/// Every built-in named writeable, across all categories.
pub fn named_writeables() -> Vec<Entry> {
    let mut entries = query_builder_entries();
    entries.extend(expression_entries());
    entries.extend(function_entries());
    entries
}

/// Every built-in plan operator.
pub fn plan_entries() -> Vec<PlanEntry> {
    vec![
        PlanEntry::logical_node::<EsRelation>(),
        PlanEntry::logical_node::<Filter>(),
        PlanEntry::logical_node::<Project>(),
        PlanEntry::logical_node::<Aggregate>(),
        PlanEntry::logical_node::<Limit>(),
        PlanEntry::logical_node::<OrderBy>(),
        PlanEntry::physical_node::<EsQueryExec>(),
        PlanEntry::physical_node::<FilterExec>(),
        PlanEntry::physical_node::<ProjectExec>(),
        PlanEntry::physical_node::<LimitExec>(),
        PlanEntry::physical_node::<AggregateExec>(),
        PlanEntry::physical_node::<ExchangeExec>(),
        PlanEntry::physical_node::<TopNExec>(),
        PlanEntry::physical_node::<FragmentExec>(),
    ]
}

/// Both registries built from the built-in lists.
pub fn default_registries() -> Result<(NamedWriteableRegistry, PlanNameRegistry)> {
    Ok((
        NamedWriteableRegistry::try_new(named_writeables())?,
        PlanNameRegistry::try_new(plan_entries())?,
    ))
}
