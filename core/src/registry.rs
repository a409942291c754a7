//! Name registry for polymorphic plan values.
//!
//! Every open category (query builders, attributes, expressions, ...) is a
//! closed enum on the Rust side. The registry maps the `(category, name)`
//! pairs that appear on the wire to the reader functions that rebuild the
//! matching variant, and is the only place where new encodable kinds are
//! introduced.

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};
use std::io::Write;

use planwire_common::error::{CommonError, Result};
use tracing::debug;

use crate::expression::function::{AggregateFunction, ScalarFunction};
use crate::expression::{Attribute, Expression, NamedExpression};
use crate::query::QueryBuilder;
use crate::stream::{PlanStreamInput, PlanStreamOutput};

/// Capability families that scope name uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    QueryBuilder,
    Attribute,
    NamedExpression,
    Expression,
    ScalarFunction,
    AggregateFunction,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::QueryBuilder => "QueryBuilder",
            Category::Attribute => "Attribute",
            Category::NamedExpression => "NamedExpression",
            Category::Expression => "Expression",
            Category::ScalarFunction => "ScalarFunction",
            Category::AggregateFunction => "AggregateFunction",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rebuilds a value of one category from a plan stream.
pub type Reader<T> = fn(&mut PlanStreamInput<'_>) -> Result<T>;

/// The closed set of reader shapes a registry can hold.
#[derive(Clone, Copy)]
pub enum Factory {
    QueryBuilder(Reader<QueryBuilder>),
    Attribute(Reader<Attribute>),
    NamedExpression(Reader<NamedExpression>),
    Expression(Reader<Expression>),
    ScalarFunction(Reader<ScalarFunction>),
    AggregateFunction(Reader<AggregateFunction>),
}

impl Factory {
    pub fn category(&self) -> Category {
        match self {
            Factory::QueryBuilder(_) => Category::QueryBuilder,
            Factory::Attribute(_) => Category::Attribute,
            Factory::NamedExpression(_) => Category::NamedExpression,
            Factory::Expression(_) => Category::Expression,
            Factory::ScalarFunction(_) => Category::ScalarFunction,
            Factory::AggregateFunction(_) => Category::AggregateFunction,
        }
    }
}

impl Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Factory({})", self.category())
    }
}

/// Contract for values written through [`PlanStreamOutput::write_named_writeable`].
///
/// `write_to` writes the body only; the stream writes the name in front of it.
pub trait NamedWriteable: Sized + 'static {
    const CATEGORY: Category;

    /// The name this value declares within [`Self::CATEGORY`].
    fn writeable_name(&self) -> &'static str;

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()>;

    fn wrap_reader(reader: Reader<Self>) -> Factory;

    fn unwrap_reader(factory: Factory) -> Option<Reader<Self>>;
}

/// A concrete node struct whose body can be read on its own and then lifted
/// into any category it belongs to.
pub trait NodeBody: Sized {
    fn read_body(input: &mut PlanStreamInput<'_>) -> Result<Self>;
}

/// Reader that decodes the body of `N` and converts it into `T`.
pub fn read_as<N, T>(input: &mut PlanStreamInput<'_>) -> Result<T>
where
    N: NodeBody + Into<T>,
{
    N::read_body(input).map(Into::into)
}

/// Implements the factory plumbing of [`NamedWriteable`] for one category.
macro_rules! category_factory {
    ($variant:ident) => {
        const CATEGORY: $crate::registry::Category = $crate::registry::Category::$variant;

        fn wrap_reader(reader: $crate::registry::Reader<Self>) -> $crate::registry::Factory {
            $crate::registry::Factory::$variant(reader)
        }

        fn unwrap_reader(
            factory: $crate::registry::Factory,
        ) -> Option<$crate::registry::Reader<Self>> {
            match factory {
                $crate::registry::Factory::$variant(reader) => Some(reader),
                _ => None,
            }
        }
    };
}

pub(crate) use category_factory;

/// One registration: a name within a category and the reader for it.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    category: Category,
    name: &'static str,
    factory: Factory,
}

impl Entry {
    pub fn new<T: NamedWriteable>(name: &'static str, reader: Reader<T>) -> Self {
        Self {
            category: T::CATEGORY,
            name,
            factory: T::wrap_reader(reader),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Immutable `(category, name) -> reader` map, built once and shared.
#[derive(Debug, Default)]
pub struct NamedWriteableRegistry {
    categories: BTreeMap<Category, BTreeMap<&'static str, Factory>>,
    len: usize,
}

impl NamedWriteableRegistry {
    /// Build a registry, rejecting any repeated `(category, name)` pair.
    pub fn try_new<I: IntoIterator<Item = Entry>>(entries: I) -> Result<Self> {
        let mut categories: BTreeMap<Category, BTreeMap<&'static str, Factory>> = BTreeMap::new();
        let mut len = 0;
        for entry in entries {
            let names = categories.entry(entry.category).or_default();
            if names.insert(entry.name, entry.factory).is_some() {
                return Err(CommonError::duplicate_name(
                    entry.category.as_str(),
                    entry.name,
                ));
            }
            len += 1;
        }
        debug!(
            entries = len,
            categories = categories.len(),
            "built named writeable registry"
        );
        Ok(Self { categories, len })
    }

    /// Resolve the reader registered for `name` in `T`'s category.
    pub fn lookup<T: NamedWriteable>(&self, name: &str) -> Result<Reader<T>> {
        let factory = self
            .categories
            .get(&T::CATEGORY)
            .and_then(|names| names.get(name))
            .ok_or_else(|| CommonError::unknown_name(T::CATEGORY.as_str(), name))?;
        // entries are filed under the category of their reader
        T::unwrap_reader(*factory).ok_or_else(|| {
            CommonError::internal_error(format!(
                "[{}] entry [{}] holds a {:?}",
                T::CATEGORY,
                name,
                factory
            ))
        })
    }

    /// The name `value` is written under, if this registry knows it.
    pub fn name_for<T: NamedWriteable>(&self, value: &T) -> Result<&'static str> {
        let name = value.writeable_name();
        if self.contains(T::CATEGORY, name) {
            Ok(name)
        } else {
            Err(CommonError::unregistered_type(T::CATEGORY.as_str(), name))
        }
    }

    pub fn contains(&self, category: Category, name: &str) -> bool {
        self.categories
            .get(&category)
            .is_some_and(|names| names.contains_key(name))
    }

    /// Registered names of one category, in sorted order.
    pub fn names(&self, category: Category) -> Vec<&'static str> {
        self.categories
            .get(&category)
            .map(|names| names.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::named_writeables;
    use crate::query::QueryBuilder;

    fn read_match_all(_input: &mut PlanStreamInput<'_>) -> Result<QueryBuilder> {
        Ok(QueryBuilder::MatchAll)
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let entries = vec![
            Entry::new::<QueryBuilder>("MatchAll", read_match_all),
            Entry::new::<QueryBuilder>("MatchAll", read_match_all),
        ];
        let err = NamedWriteableRegistry::try_new(entries).unwrap_err();
        assert!(matches!(
            err,
            CommonError::DuplicateName { ref category, ref name }
                if category == "QueryBuilder" && name == "MatchAll"
        ));
    }

    #[test]
    fn test_same_name_in_two_categories() {
        let entries = named_writeables();
        let registry = NamedWriteableRegistry::try_new(entries).unwrap();

        assert!(registry.contains(Category::Attribute, "FieldAttribute"));
        assert!(registry.contains(Category::NamedExpression, "FieldAttribute"));
        assert!(registry.contains(Category::Expression, "FieldAttribute"));
        assert!(!registry.contains(Category::QueryBuilder, "FieldAttribute"));
    }

    #[test]
    fn test_lookup_unknown_name() {
        let registry = NamedWriteableRegistry::try_new(named_writeables()).unwrap();
        let err = registry.lookup::<QueryBuilder>("Fuzzy").unwrap_err();
        assert!(matches!(err, CommonError::UnknownName { .. }));

        // a name is scoped to its category
        let err = registry.lookup::<QueryBuilder>("Alias").unwrap_err();
        assert!(matches!(err, CommonError::UnknownName { .. }));
    }

    #[test]
    fn test_name_for_requires_registration() {
        let registry = NamedWriteableRegistry::try_new(vec![Entry::new::<QueryBuilder>(
            "MatchAll",
            read_match_all,
        )])
        .unwrap();

        assert_eq!(registry.name_for(&QueryBuilder::MatchAll).unwrap(), "MatchAll");
        let exists = QueryBuilder::Exists {
            field: "host".to_string(),
        };
        assert!(matches!(
            registry.name_for(&exists).unwrap_err(),
            CommonError::UnregisteredType { .. }
        ));
    }

    #[test]
    fn test_names_are_sorted() {
        let registry = NamedWriteableRegistry::try_new(named_writeables()).unwrap();
        let names = registry.names(Category::AggregateFunction);
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(names.contains(&"CountDistinct"));
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_misfiled_entry_is_internal_error() {
        let misfiled = Entry {
            category: Category::Expression,
            name: "MatchAll",
            factory: Factory::QueryBuilder(read_match_all),
        };
        let registry = NamedWriteableRegistry::try_new(vec![misfiled]).unwrap();

        let err = registry.lookup::<Expression>("MatchAll").unwrap_err();
        assert!(matches!(err, CommonError::InternalError { .. }));
        assert!(err.to_string().contains("Factory(QueryBuilder)"));
    }
}
