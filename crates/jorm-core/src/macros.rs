//! Declarative helpers for entity declarations and argument lists.

/// Implement [`Entity`](crate::catalog::Entity) for a struct from a field list.
///
/// Each field is declared with its Rust type and an optional directive tag.
/// Kind and nullability come from the type, and the generated accessors
/// read and write the struct fields directly, so a declaration that does not
/// match the struct fails to compile.
///
/// ```ignore
/// #[derive(Debug, Default)]
/// struct User {
///     id: i64,
///     name: String,
///     age: i32,
/// }
///
/// jorm::impl_entity! {
///     User, table = "users" {
///         id: i64 => "primaryKey;autoIncrement",
///         name: String => "column:username",
///         age: i32,
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_entity {
    (
        $ty:ident $(, table = $table:literal)? {
            $( $field:ident : $fty:ty $(=> $tag:literal)? ),* $(,)?
        }
    ) => {
        impl $crate::catalog::Entity for $ty {
            fn schema() -> $crate::catalog::EntitySchema {
                $crate::catalog::EntitySchema::new(stringify!($ty))
                    $( .with_table($table) )?
                    $(
                        .with_field(
                            $crate::catalog::FieldDef::of::<$fty>(stringify!($field))
                                $( .tag($tag) )?
                        )
                    )*
            }

            fn get(&self, field: &str) -> ::std::option::Option<$crate::value::Value> {
                $(
                    if field == stringify!($field) {
                        return ::std::option::Option::Some(
                            <$fty as $crate::value::SqlType>::to_value(&self.$field),
                        );
                    }
                )*
                ::std::option::Option::None
            }

            fn set(
                &mut self,
                field: &str,
                value: $crate::value::Value,
            ) -> ::std::result::Result<(), $crate::value::CoerceError> {
                $(
                    if field == stringify!($field) {
                        self.$field = <$fty as $crate::value::SqlType>::from_value(value)?;
                        return ::std::result::Result::Ok(());
                    }
                )*
                drop(value);
                ::std::result::Result::Err($crate::value::CoerceError::UnknownField(field.to_string()))
            }
        }
    };
}

/// Build a `Vec<Value>` of statement arguments from mixed Rust values.
///
/// ```ignore
/// let users = engine.model::<User>().filter("age BETWEEN ? AND ?", jorm::args![18, 30]).find_all()?;
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::value::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$( $crate::value::Value::from($arg) ),+]
    };
}

#[cfg(test)]
mod tests {
    use crate::catalog::{ColumnKind, Entity};
    use crate::value::{CoerceError, Value};
    use chrono::{DateTime, Utc};

    #[derive(Debug, Default, PartialEq)]
    struct Profile {
        id: i64,
        handle: String,
        bio: Option<String>,
        joined_at: DateTime<Utc>,
    }

    crate::impl_entity! {
        Profile {
            id: i64 => "primaryKey;autoIncrement",
            handle: String => "column:user_handle",
            bio: Option<String>,
            joined_at: DateTime<Utc> => "auto_time",
        }
    }

    #[test]
    fn test_generated_schema() {
        let schema = Profile::schema();
        assert_eq!(schema.type_name(), "Profile");
        assert_eq!(schema.table(), None);

        let fields = schema.fields();
        assert_eq!(fields.len(), 4);
        assert!(fields[0].directives.primary_key);
        assert_eq!(fields[1].directives.column.as_deref(), Some("user_handle"));
        assert!(fields[2].nullable);
        assert_eq!(fields[3].kind, ColumnKind::Temporal);
        assert!(fields[3].directives.auto_time);
    }

    #[test]
    fn test_generated_accessors() {
        let mut profile = Profile::default();
        profile.set("handle", Value::Text("ferris".into())).unwrap();
        profile.set("id", Value::Text("12".into())).unwrap();
        profile.set("bio", Value::Null).unwrap();

        assert_eq!(profile.id, 12);
        assert_eq!(profile.get("handle"), Some(Value::Text("ferris".into())));
        assert_eq!(profile.get("bio"), Some(Value::Null));
        assert_eq!(profile.get("nope"), None);

        assert_eq!(
            profile.set("nope", Value::Int(1)),
            Err(CoerceError::UnknownField("nope".into()))
        );
        assert!(profile.set("id", Value::Text("x".into())).is_err());
    }

    #[test]
    fn test_args_macro() {
        let args = crate::args![1, "a", true, None::<i64>];
        assert_eq!(
            args,
            vec![
                Value::Int(1),
                Value::Text("a".into()),
                Value::Bool(true),
                Value::Null
            ]
        );
        assert!(crate::args![].is_empty());
    }
}
