pub mod builders;
pub mod value;

pub use builders::{
    add_range_nested_fields, build_nested, build_nested_with_skip, get_path, leaf_paths,
    nesting_depth, set_field, set_field_path, set_many_fields,
};
pub use value::{DocNumber, DocValue, Document, FastMap};
