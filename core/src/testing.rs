//! Round-trip helpers for tests.
//!
//! Every helper writes a value into a fresh in-memory stream, reads it back
//! with the same registries and configuration, and checks that the copy is
//! indistinguishable from the original by equality and hash. Any error along
//! the way fails the calling test.

use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use planwire_common::config::SessionConfiguration;
use planwire_common::error::{Diagnose, Result};
use rayon::prelude::*;
use tracing::{Level, debug};

use crate::entries::default_registries;
use crate::expression::Expression;
use crate::logical_plan::LogicalPlan;
use crate::physical_plan::PhysicalPlan;
use crate::plan_registry::PlanNameRegistry;
use crate::query::QueryBuilder;
use crate::registry::NamedWriteableRegistry;
use crate::stream::{PlanStreamInput, PlanStreamOutput};

/// Query text of [`test_configuration`]; sources pointing into it are
/// written without their text from `SOURCE_OFFSETS` on.
pub const TEST_QUERY: &str = "FROM logs\n| WHERE status == \"active\"";

static REGISTRIES: LazyLock<(NamedWriteableRegistry, PlanNameRegistry)> = LazyLock::new(|| {
    default_registries().unwrap_or_else(|e| panic!("built-in registries are invalid: {}", e))
});

static TEST_CONFIGURATION: LazyLock<SessionConfiguration> = LazyLock::new(|| {
    SessionConfiguration::builder()
        .query(TEST_QUERY)
        .username("test")
        .now_millis(1_700_000_000_000)
        .build()
        .unwrap_or_else(|e| panic!("test configuration is invalid: {}", e))
});

/// The process-wide registries, built from the built-in entries on first use.
pub fn registries() -> (&'static NamedWriteableRegistry, &'static PlanNameRegistry) {
    let (registry, plan_registry) = &*REGISTRIES;
    (registry, plan_registry)
}

/// Session configuration used when a test does not pick one.
pub fn test_configuration() -> &'static SessionConfiguration {
    &TEST_CONFIGURATION
}

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Write `original` with `write`, then read a copy back with `read`.
///
/// The reader must consume every byte the writer produced.
pub fn serialize_deserialize<T, WF, RF>(
    original: &T,
    write: WF,
    read: RF,
    configuration: &SessionConfiguration,
) -> Result<T>
where
    WF: FnOnce(&mut PlanStreamOutput<'_>, &T) -> Result<()>,
    RF: FnOnce(&mut PlanStreamInput<'_>) -> Result<T>,
{
    let (registry, plan_registry) = registries();
    let mut out = PlanStreamOutput::new(registry, plan_registry, configuration);
    write(&mut out, original)?;
    let bytes = out.into_inner()?;
    debug!(
        bytes = bytes.len(),
        version = %configuration.transport_version(),
        "serialized value"
    );

    let mut input = PlanStreamInput::new(bytes, registry, plan_registry, configuration);
    let copy = read(&mut input)?;
    input.finish()?;
    Ok(copy)
}

/// Round trip `original` and check the copy with [`check_equals_and_hash`].
///
/// Panics on any encode or decode error.
pub fn assert_serialization_with<T, WF, RF>(
    original: &T,
    write: WF,
    read: RF,
    configuration: &SessionConfiguration,
) where
    T: PartialEq + Hash + Debug,
    WF: FnOnce(&mut PlanStreamOutput<'_>, &T) -> Result<()>,
    RF: FnOnce(&mut PlanStreamInput<'_>) -> Result<T>,
{
    match serialize_deserialize(original, write, read, configuration) {
        Ok(copy) => check_equals_and_hash(original, &copy),
        Err(e) => panic!(
            "round trip of {:?} failed: {} ({})",
            original,
            e,
            e.suggestions().join("; ")
        ),
    }
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Equality in both directions and matching, stable hashes.
pub fn check_equals_and_hash<T: PartialEq + Hash + Debug>(original: &T, copy: &T) {
    assert_eq!(original, original, "equality is not reflexive");
    assert_eq!(original, copy, "copy differs from the original");
    assert_eq!(copy, original, "equality is not symmetric");
    let hash = hash_of(original);
    assert_eq!(hash, hash_of(original), "hash is not stable");
    assert_eq!(hash, hash_of(copy), "copy hashes differently");
}

pub fn assert_physical_plan_serialization(plan: &PhysicalPlan) {
    assert_physical_plan_serialization_with(plan, test_configuration());
}

pub fn assert_physical_plan_serialization_with(
    plan: &PhysicalPlan,
    configuration: &SessionConfiguration,
) {
    assert_serialization_with(
        plan,
        |out, plan| out.write_physical_plan_node(plan),
        |input| input.read_physical_plan_node(),
        configuration,
    );
}

pub fn assert_logical_plan_serialization(plan: &LogicalPlan) {
    assert_serialization_with(
        plan,
        |out, plan| out.write_logical_plan_node(plan),
        |input| input.read_logical_plan_node(),
        test_configuration(),
    );
}

pub fn assert_expression_serialization(expression: &Expression) {
    assert_expression_serialization_with(expression, test_configuration());
}

pub fn assert_expression_serialization_with(
    expression: &Expression,
    configuration: &SessionConfiguration,
) {
    assert_serialization_with(
        expression,
        |out, expression| out.write_named_writeable(expression),
        |input| input.read_named_writeable(),
        configuration,
    );
}

pub fn assert_query_builder_serialization(query: &QueryBuilder) {
    assert_query_builder_serialization_with(query, test_configuration());
}

pub fn assert_query_builder_serialization_with(
    query: &QueryBuilder,
    configuration: &SessionConfiguration,
) {
    assert_serialization_with(
        query,
        |out, query| out.write_named_writeable(query),
        |input| input.read_named_writeable(),
        configuration,
    );
}

/// Round trip every item on the rayon pool, sharing one registry pair.
pub fn assert_serialization_all<T, WF, RF>(
    items: &[T],
    write: WF,
    read: RF,
    configuration: &SessionConfiguration,
) where
    T: PartialEq + Hash + Debug + Sync,
    WF: Fn(&mut PlanStreamOutput<'_>, &T) -> Result<()> + Sync,
    RF: Fn(&mut PlanStreamInput<'_>) -> Result<T> + Sync,
{
    items.par_iter().for_each(|item| {
        assert_serialization_with(item, &write, &read, configuration);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;
    use crate::source::Source;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
        debug!("tracing initialized twice");
    }

    #[test]
    fn test_registries_are_shared() {
        let (first, _) = registries();
        let (second, _) = registries();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_trailing_bytes_fail_the_round_trip() {
        let literal: Expression = Literal::of(Source::EMPTY, 7).into();
        let result = serialize_deserialize(
            &literal,
            |out, value| {
                out.write_named_writeable(value)?;
                out.write_u8(0)
            },
            |input| input.read_named_writeable(),
            test_configuration(),
        );
        assert!(result.is_err());
    }

    #[test]
    #[should_panic(expected = "writer and reader were built from the same entry list")]
    fn test_failed_round_trip_panics() {
        let literal: Expression = Literal::of(Source::EMPTY, 7).into();
        assert_serialization_with(
            &literal,
            |out, value| out.write_named_writeable(value),
            |input| input.read_named_writeable::<QueryBuilder>().map(|_| literal.clone()),
            test_configuration(),
        );
    }
}
