//! Plan, expression and query fixtures shared by the integration tests.
#![allow(dead_code)]

use planwire_common::config::SessionConfiguration;
use planwire_common::version::TransportVersion;
use planwire_core::expression::{
    AggregateFunction, Alias, BinaryComparison, BinaryLogic, ComparisonOperator, EsField,
    Expression, FieldAttribute, IsNotNull, IsNull, LogicOperator, MetadataAttribute, NameId,
    NamedExpression, Not, ReferenceAttribute, ScalarFunction, UnsupportedAttribute,
};
use planwire_core::literal::{Literal, LiteralValue};
use planwire_core::logical_plan::{
    Aggregate, EsRelation, Filter, IndexMode, Limit, LogicalPlan, Order, OrderBy, OrderDirection,
    Project,
};
use planwire_core::physical_plan::{
    AggregateExec, AggregateMode, EsQueryExec, ExchangeExec, FilterExec, FragmentExec, LimitExec,
    PhysicalPlan, ProjectExec, TopNExec,
};
use planwire_core::query::QueryBuilder;
use planwire_core::source::Source;
use planwire_core::testing::test_configuration;
use planwire_core::types::DataType;

/// `status` as it appears in the test query.
pub fn status_source() -> Source {
    Source::new(2, 9, "status")
}

/// The whole `WHERE` clause of the test query.
pub fn where_source() -> Source {
    Source::new(2, 3, "WHERE status == \"active\"")
}

pub fn from_source() -> Source {
    Source::new(1, 1, "FROM logs")
}

pub fn config_at(version: TransportVersion) -> SessionConfiguration {
    test_configuration().with_transport_version(version)
}

pub fn field(name: &str, data_type: DataType, id: u64) -> FieldAttribute {
    FieldAttribute::new(
        Source::EMPTY,
        name,
        EsField::new(name, data_type, true),
        NameId(id),
    )
}

pub fn status() -> Expression {
    let mut status = field("status", DataType::Keyword, 1);
    status.source = status_source();
    status.into()
}

pub fn bytes() -> Expression {
    field("bytes", DataType::Long, 2).into()
}

pub fn literal<V: Into<LiteralValue>>(value: V) -> Expression {
    Literal::of(Source::EMPTY, value).into()
}

pub fn compare(op: ComparisonOperator, left: Expression, right: Expression) -> Expression {
    BinaryComparison::new(where_source(), op, left, right).into()
}

/// `status == "active" AND bytes > 1024`
pub fn two_child_condition() -> Expression {
    BinaryLogic::new(
        where_source(),
        LogicOperator::And,
        compare(ComparisonOperator::Equals, status(), literal("active")),
        compare(ComparisonOperator::GreaterThan, bytes(), literal(1024i64)),
    )
    .into()
}

pub fn relation() -> EsRelation {
    let status = field("status", DataType::Keyword, 1);
    let bytes = field("bytes", DataType::Long, 2);
    EsRelation::new(from_source(), "logs", vec![status.into(), bytes.into()])
}

/// `FROM logs | WHERE status == "active" AND bytes > 1024`
pub fn filter_plan() -> LogicalPlan {
    Filter::new(where_source(), relation().into(), two_child_condition()).into()
}

pub fn sum_bytes() -> NamedExpression {
    let sum = AggregateFunction::Sum {
        source: Source::EMPTY,
        field: Box::new(bytes()),
    };
    Alias::new(Source::EMPTY, "total", sum.into(), NameId(10)).into()
}

pub fn all_logical_plans() -> Vec<LogicalPlan> {
    let mut time_series = relation();
    time_series.index_mode = IndexMode::TimeSeries;
    time_series.frozen = true;

    vec![
        relation().into(),
        time_series.into(),
        filter_plan(),
        Project::new(
            Source::EMPTY,
            filter_plan(),
            vec![field("status", DataType::Keyword, 1).into()],
        )
        .into(),
        Aggregate::new(Source::EMPTY, filter_plan(), vec![status()], vec![sum_bytes()]).into(),
        Limit::new(Source::EMPTY, literal(10), filter_plan()).into(),
        OrderBy::new(
            Source::EMPTY,
            relation().into(),
            vec![
                Order::new(Source::EMPTY, bytes(), OrderDirection::Desc),
                Order::new(status_source(), status(), OrderDirection::Asc),
            ],
        )
        .into(),
    ]
}

pub fn es_query_exec() -> PhysicalPlan {
    let relation = relation();
    let mut exec = EsQueryExec::new(
        from_source(),
        "logs",
        relation.attributes,
        Some(QueryBuilder::term("status", "active")),
    );
    exec.limit = Some(literal(1000));
    exec.estimated_row_size = Some(64);
    exec.into()
}

/// `LimitExec <- ProjectExec <- FilterExec <- EsQueryExec`
pub fn physical_plan() -> PhysicalPlan {
    let filter = FilterExec::new(where_source(), es_query_exec(), two_child_condition());
    let project = ProjectExec::new(
        Source::EMPTY,
        filter.into(),
        vec![field("status", DataType::Keyword, 1).into()],
    );
    LimitExec::new(Source::EMPTY, project.into(), literal(10)).into()
}

pub fn all_physical_plans() -> Vec<PhysicalPlan> {
    let mut fragment = FragmentExec::new(filter_plan());
    fragment.es_filter = Some(QueryBuilder::exists("status"));
    fragment.estimated_row_size = 128;

    let mut exchange = ExchangeExec::new(
        Source::EMPTY,
        vec![field("status", DataType::Keyword, 1).into()],
        fragment.clone().into(),
    );
    exchange.in_between_aggs = true;

    let mut partial = AggregateExec::new(
        Source::EMPTY,
        es_query_exec(),
        vec![status()],
        vec![sum_bytes()],
        AggregateMode::Initial,
    );
    partial.estimated_row_size = Some(24);

    vec![
        es_query_exec(),
        EsQueryExec::new(Source::EMPTY, "logs-*", Vec::new(), None).into(),
        physical_plan(),
        partial.into(),
        exchange.into(),
        TopNExec::new(
            Source::EMPTY,
            fragment.clone().into(),
            vec![Order::new(Source::EMPTY, bytes(), OrderDirection::Desc)],
            literal(5),
        )
        .into(),
        fragment.into(),
    ]
}

pub fn all_query_builders() -> Vec<QueryBuilder> {
    vec![
        QueryBuilder::term("status", "active"),
        QueryBuilder::Term {
            field: "code".to_string(),
            value: LiteralValue::Integer(404),
            case_insensitive: true,
        },
        QueryBuilder::Terms {
            field: "status".to_string(),
            values: vec!["active".into(), "idle".into()],
        },
        QueryBuilder::MatchAll,
        QueryBuilder::Range {
            field: "@timestamp".to_string(),
            from: Some(LiteralValue::Datetime(1_700_000_000_000)),
            to: None,
            include_lower: true,
            include_upper: false,
            format: Some("strict_date_optional_time".to_string()),
            time_zone: Some("UTC".to_string()),
        },
        QueryBuilder::Bool {
            must: vec![QueryBuilder::exists("host")],
            filter: vec![QueryBuilder::term("status", "active")],
            should: Vec::new(),
            must_not: vec![QueryBuilder::MatchAll],
            minimum_should_match: Some("1".to_string()),
        },
        QueryBuilder::Wildcard {
            field: "host".to_string(),
            pattern: "web-*".to_string(),
            case_insensitive: false,
        },
        QueryBuilder::Regexp {
            field: "host".to_string(),
            pattern: "web-[0-9]+".to_string(),
            flags: 0xff,
            case_insensitive: true,
        },
        QueryBuilder::exists("host"),
        QueryBuilder::SingleValue {
            next: Box::new(QueryBuilder::term("status", "active")),
            field: "status".to_string(),
            source: where_source(),
        },
    ]
}

pub fn all_expressions() -> Vec<Expression> {
    let configuration = test_configuration();
    let source = Source::EMPTY;

    let mut reference = ReferenceAttribute::new(status_source(), "s", DataType::Keyword, NameId(3));
    reference.qualifier = Some("logs".to_string());
    let mut unsupported =
        UnsupportedAttribute::new(source.clone(), "geo", "geo_shape", NameId(4));
    unsupported.message = Some("unsupported type [geo_shape]".to_string());

    let mut expressions = vec![
        status(),
        reference.into(),
        MetadataAttribute::new(source.clone(), "_index", DataType::Keyword, true, NameId(5))
            .into(),
        unsupported.into(),
        Alias::new(source.clone(), "s", status(), NameId(6)).into(),
        literal(LiteralValue::Null),
        literal(true),
        literal(3.25),
        literal(f64::NAN),
        literal(LiteralValue::Datetime(1_700_000_000_000)),
        literal(LiteralValue::List(vec![
            LiteralValue::Integer(1),
            LiteralValue::Integer(2),
        ])),
        two_child_condition(),
        BinaryLogic::new(source.clone(), LogicOperator::Or, status(), bytes()).into(),
        Not::new(source.clone(), status()).into(),
        IsNull::new(source.clone(), bytes()).into(),
        IsNotNull::new(source.clone(), bytes()).into(),
    ];
    expressions.extend(
        ComparisonOperator::ALL
            .iter()
            .map(|op| compare(*op, bytes(), literal(1024i64))),
    );

    let status_child = || Box::new(status());
    let scalars = vec![
        ScalarFunction::Length {
            source: source.clone(),
            field: status_child(),
        },
        ScalarFunction::ToUpper {
            source: source.clone(),
            field: status_child(),
        },
        ScalarFunction::ToLower {
            source: source.clone(),
            field: status_child(),
        },
        ScalarFunction::Concat {
            source: source.clone(),
            first: status_child(),
            rest: vec![literal("-"), bytes()],
        },
        ScalarFunction::Abs {
            source: source.clone(),
            field: Box::new(bytes()),
        },
        ScalarFunction::Round {
            source: source.clone(),
            field: Box::new(literal(2.5)),
            decimals: Some(Box::new(literal(1))),
        },
        ScalarFunction::Round {
            source: source.clone(),
            field: Box::new(literal(2.5)),
            decimals: None,
        },
        ScalarFunction::date_format(
            source.clone(),
            literal(LiteralValue::Datetime(0)),
            Some(literal("yyyy-MM-dd")),
            configuration,
        ),
        ScalarFunction::now(source.clone(), configuration),
    ];
    expressions.extend(scalars.into_iter().map(Expression::from));

    let aggregates = vec![
        AggregateFunction::Count {
            source: source.clone(),
            field: status_child(),
        },
        AggregateFunction::CountDistinct {
            source: source.clone(),
            field: status_child(),
            precision: Some(Box::new(literal(3000))),
        },
        AggregateFunction::Sum {
            source: source.clone(),
            field: Box::new(bytes()),
        },
        AggregateFunction::Min {
            source: source.clone(),
            field: Box::new(bytes()),
        },
        AggregateFunction::Max {
            source: source.clone(),
            field: Box::new(bytes()),
        },
        AggregateFunction::Avg {
            source,
            field: Box::new(bytes()),
        },
    ];
    expressions.extend(aggregates.into_iter().map(Expression::from));
    expressions
}
