//! Built-in structural validators.
//!
//! Business rules (presence, length, format, uniqueness) are supplied by
//! the application as [`ValidatorFactory`](crosscheck_core::ValidatorFactory)
//! implementations. The validators here describe the shape of a value:
//! its JSON kind, its object fields and its array elements.

pub mod array;
pub mod is;
pub mod object;

pub use array::{array, items, ItemsFactory};
pub use is::{
    is_array, is_boolean, is_number, is_object, is_present, is_string, PresenceGuard, TypeGuard,
    ValueKind,
};
pub use object::{
    all_fields_present, fields, no_fields_extra, object, strict_object, AllFieldsPresentFactory,
    FieldsFactory, NoFieldsExtraFactory, Record,
};
