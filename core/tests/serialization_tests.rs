//! Round trips of plans, expressions and query builders through the plan
//! streams, and the exact wire layout of a few small values.

mod common;

use common::*;
use planwire_common::config::SessionConfiguration;
use planwire_common::error::CommonError;
use planwire_common::version::TransportVersion;
use planwire_core::expression::{Expression, LogicOperator, Not};
use planwire_core::logical_plan::LogicalPlan;
use planwire_core::query::QueryBuilder;
use planwire_core::source::Source;
use planwire_core::stream::{MAX_NESTING_DEPTH, PlanStreamInput, PlanStreamOutput};
use planwire_core::testing::{
    assert_expression_serialization, assert_expression_serialization_with,
    assert_logical_plan_serialization, assert_physical_plan_serialization,
    assert_physical_plan_serialization_with, assert_query_builder_serialization,
    assert_query_builder_serialization_with, assert_serialization_all, registries,
    serialize_deserialize, test_configuration,
};
use planwire_core::NamedWriteable;
use planwire_core::literal::LiteralValue;
use tracing_test::traced_test;

fn encode_expression(expression: &Expression, config: &SessionConfiguration) -> Vec<u8> {
    let (registry, plan_registry) = registries();
    let mut out = PlanStreamOutput::new(registry, plan_registry, config);
    out.write_named_writeable(expression).unwrap();
    out.into_inner().unwrap()
}

#[test]
#[traced_test]
fn test_term_query_wire_layout() {
    let config = config_at(TransportVersion::INITIAL);
    let (registry, plan_registry) = registries();
    let mut out = PlanStreamOutput::new(registry, plan_registry, &config);
    out.write_named_writeable(&QueryBuilder::term("status", "active"))
        .unwrap();

    // transport version id in front of the top-level node
    let mut expected = vec![1, 4];
    expected.extend_from_slice(b"Term");
    expected.push(6);
    expected.extend_from_slice(b"status");
    // keyword variant of the literal value, then its length-prefixed text
    expected.extend_from_slice(&[5, 6]);
    expected.extend_from_slice(b"active");
    // case_insensitive
    expected.push(0);
    assert_eq!(out.bytes(), expected.as_slice());
}

#[test]
fn test_header_byte_follows_name() {
    let config = config_at(TransportVersion::NODE_HEADER);
    let (registry, plan_registry) = registries();
    let mut out = PlanStreamOutput::new(registry, plan_registry, &config);
    out.write_named_writeable(&QueryBuilder::MatchAll).unwrap();

    let mut expected = vec![2, 8];
    expected.extend_from_slice(b"MatchAll");
    expected.push(2);
    assert_eq!(out.bytes(), expected.as_slice());
}

#[test]
#[traced_test]
fn test_filter_with_two_child_expressions() {
    let plan = filter_plan();
    assert_logical_plan_serialization(&plan);

    let copy = serialize_deserialize(
        &plan,
        |out, plan| out.write_logical_plan_node(plan),
        |input| input.read_logical_plan_node(),
        test_configuration(),
    )
    .unwrap();

    let LogicalPlan::Filter(filter) = &copy else {
        panic!("expected a filter, got {:?}", copy);
    };
    assert!(matches!(filter.child.as_ref(), LogicalPlan::EsRelation(_)));
    let Expression::Logic(and) = &filter.condition else {
        panic!("expected a conjunction, got {:?}", filter.condition);
    };
    assert_eq!(and.op, LogicOperator::And);
    assert_eq!(and.left.writeable_name(), "Equals");
    assert_eq!(and.right.writeable_name(), "GreaterThan");
    assert_eq!(and.left.children()[0], &status());
    assert_eq!(and.right.children()[1], &literal(1024i64));
}

#[test]
#[traced_test]
fn test_every_expression_round_trips() {
    let expressions = all_expressions();
    for expression in &expressions {
        assert_expression_serialization(expression);
    }
}

#[test]
fn test_every_query_builder_round_trips() {
    for query in &all_query_builders() {
        assert_query_builder_serialization(query);
    }
}

#[test]
fn test_every_logical_plan_round_trips() {
    for plan in &all_logical_plans() {
        assert_logical_plan_serialization(plan);
    }
}

#[test]
#[traced_test]
fn test_every_physical_plan_round_trips() {
    for plan in &all_physical_plans() {
        assert_physical_plan_serialization(plan);
    }
}

#[test]
fn test_round_trips_under_every_version() {
    for version in [
        TransportVersion::INITIAL,
        TransportVersion::NODE_HEADER,
        TransportVersion::SOURCE_OFFSETS,
    ] {
        let config = config_at(version);
        for plan in &all_physical_plans() {
            assert_physical_plan_serialization_with(plan, &config);
        }
        for expression in &all_expressions() {
            assert_expression_serialization_with(expression, &config);
        }
        for query in &all_query_builders() {
            assert_query_builder_serialization_with(query, &config);
        }
    }
}

#[test]
fn test_wire_size_depends_on_version() {
    let expression = Expression::Literal(planwire_core::Literal::of(status_source(), 1));

    let initial = encode_expression(&expression, &config_at(TransportVersion::INITIAL)).len();
    let header = encode_expression(&expression, &config_at(TransportVersion::NODE_HEADER)).len();
    let offsets =
        encode_expression(&expression, &config_at(TransportVersion::SOURCE_OFFSETS)).len();

    // one header byte per node
    assert_eq!(header, initial + 1);
    // "status" is found in the query: length and flag replace six bytes of text
    assert_eq!(offsets, header - 5);
}

#[test]
fn test_parallel_round_trips_share_registries() {
    let plans = all_physical_plans();
    assert_serialization_all(
        &plans,
        |out, plan| out.write_physical_plan_node(plan),
        |input| input.read_physical_plan_node(),
        test_configuration(),
    );

    let expressions = all_expressions();
    assert_serialization_all(
        &expressions,
        |out, expression| out.write_named_writeable(expression),
        |input| input.read_named_writeable(),
        test_configuration(),
    );
}

#[test]
#[traced_test]
fn test_version_mismatch_is_detected() {
    let writer = config_at(TransportVersion::NODE_HEADER);
    let reader = config_at(TransportVersion::SOURCE_OFFSETS);
    let (registry, plan_registry) = registries();

    let mut out = PlanStreamOutput::new(registry, plan_registry, &writer);
    out.write_physical_plan_node(&physical_plan()).unwrap();
    let bytes = out.into_inner().unwrap();

    let mut input = PlanStreamInput::new(bytes, registry, plan_registry, &reader);
    let err = input.read_physical_plan_node().unwrap_err();
    assert!(matches!(err, CommonError::ConfigurationMismatch { .. }));
    assert!(err.to_string().contains("LimitExec"));
}

#[test]
fn test_every_truncation_fails_cleanly() {
    let config = test_configuration();
    let (registry, plan_registry) = registries();
    let mut out = PlanStreamOutput::new(registry, plan_registry, config);
    out.write_physical_plan_node(&physical_plan()).unwrap();
    let bytes = out.into_inner().unwrap();

    for len in 0..bytes.len() {
        let mut input =
            PlanStreamInput::new(bytes[..len].to_vec(), registry, plan_registry, config);
        let err = input.read_physical_plan_node().unwrap_err();
        assert!(
            matches!(err, CommonError::DecodingIo { .. }),
            "prefix of {} bytes gave {:?}",
            len,
            err
        );
    }
}

fn nested_not(levels: usize) -> Expression {
    let mut expression = literal(true);
    for _ in 0..levels {
        expression = Not::new(Source::EMPTY, expression).into();
    }
    expression
}

fn nested_bool(levels: usize) -> QueryBuilder {
    let mut query = QueryBuilder::MatchAll;
    for _ in 0..levels {
        query = QueryBuilder::filter(vec![query]);
    }
    query
}

// These run on the default test thread stack.

#[test]
fn test_nesting_up_to_the_limit_round_trips() {
    // the leaf is a node too
    assert_expression_serialization(&nested_not(MAX_NESTING_DEPTH - 1));
    assert_query_builder_serialization(&nested_bool(MAX_NESTING_DEPTH - 1));
}

#[test]
fn test_nesting_past_the_limit_is_rejected() {
    let config = test_configuration();
    let (registry, plan_registry) = registries();

    let bytes = encode_expression(&nested_not(MAX_NESTING_DEPTH), config);
    let mut input = PlanStreamInput::new(bytes, registry, plan_registry, config);
    let err = input.read_named_writeable::<Expression>().unwrap_err();
    assert!(matches!(err, CommonError::DecodingIo { .. }));
    assert!(err.to_string().contains("nesting"));

    let mut out = PlanStreamOutput::new(registry, plan_registry, config);
    out.write_named_writeable(&nested_bool(MAX_NESTING_DEPTH))
        .unwrap();
    let bytes = out.into_inner().unwrap();
    let mut input = PlanStreamInput::new(bytes, registry, plan_registry, config);
    let err = input.read_named_writeable::<QueryBuilder>().unwrap_err();
    assert!(matches!(err, CommonError::DecodingIo { .. }));
}

/// A `Term` query whose value is a list nested `levels` deep, built by hand.
fn deep_list_term(levels: usize, config: &SessionConfiguration) -> Vec<u8> {
    let (registry, plan_registry) = registries();
    let mut out = PlanStreamOutput::new(registry, plan_registry, config);
    out.write_vu32(config.transport_version().id()).unwrap();
    out.write_string("Term").unwrap();
    out.write_u8(config.transport_version().header_byte()).unwrap();
    out.write_string("f").unwrap();
    let mut bytes = out.into_inner().unwrap();
    for _ in 0..levels {
        // list variant holding one element
        bytes.extend_from_slice(&[7, 1]);
    }
    // null innermost value, then case_insensitive
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

#[test]
fn test_deep_literal_list_is_rejected() {
    let config = test_configuration();
    let (registry, plan_registry) = registries();

    let mut input = PlanStreamInput::new(
        deep_list_term(200_000, config),
        registry,
        plan_registry,
        config,
    );
    let err = input.read_named_writeable::<QueryBuilder>().unwrap_err();
    assert!(matches!(err, CommonError::DecodingIo { .. }));
    assert!(err.to_string().contains("nesting"));

    // the Term node itself takes one level
    let mut input = PlanStreamInput::new(
        deep_list_term(MAX_NESTING_DEPTH - 1, config),
        registry,
        plan_registry,
        config,
    );
    let QueryBuilder::Term { value, .. } = input.read_named_writeable::<QueryBuilder>().unwrap()
    else {
        panic!("expected a term query");
    };
    input.finish().unwrap();
    assert!(matches!(value, LiteralValue::List(_)));
}

#[test]
#[traced_test]
fn test_newer_writer_older_reader() {
    let writer = config_at(TransportVersion::NODE_HEADER);
    let reader = config_at(TransportVersion::INITIAL);
    let (registry, plan_registry) = registries();

    let mut out = PlanStreamOutput::new(registry, plan_registry, &writer);
    out.write_named_writeable(&QueryBuilder::exists("host"))
        .unwrap();
    let bytes = out.into_inner().unwrap();

    let mut input = PlanStreamInput::new(bytes, registry, plan_registry, &reader);
    let err = input.read_named_writeable::<QueryBuilder>().unwrap_err();
    assert!(matches!(err, CommonError::ConfigurationMismatch { .. }));
    assert!(err.to_string().contains("Exists"));
}
