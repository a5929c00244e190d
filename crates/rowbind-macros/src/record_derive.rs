//! Implementation of the Record derive macro.
//!
//! Parses `#[rowbind(...)]` attributes and generates the `Record`
//! implementation with one `FieldDescriptor` per mapped field, in
//! declaration order.

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{Data, DeriveInput, Error, Field, Fields, Ident, LitStr, Result, Type};

/// Parsed definition of a struct with `#[derive(Record)]`.
#[derive(Debug)]
pub struct RecordDef {
    /// The struct name.
    pub name: Ident,
    /// Table name from `#[rowbind(table = "...")]`, empty if absent.
    pub table: String,
    /// Mapped fields in declaration order.
    pub fields: Vec<RecordFieldDef>,
    /// Generics from the struct.
    pub generics: syn::Generics,
}

/// A single mapped field.
#[derive(Debug)]
pub struct RecordFieldDef {
    /// The field name.
    pub name: Ident,
    /// The field type.
    pub ty: Type,
    /// Database column name.
    pub column: String,
    /// Whether the database generates the value.
    pub auto_increment: bool,
    /// Whether the field has no setter.
    pub readonly: bool,
}

const NOT_A_STRUCT: &str = "Record can only be derived for structs";

/// Parse a `DeriveInput` into a `RecordDef`.
pub fn parse_record(input: &DeriveInput) -> Result<RecordDef> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named
                .named
                .iter()
                .filter_map(|field| parse_field(field).transpose())
                .collect::<Result<Vec<_>>>()?,
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(Error::new_spanned(
                    input,
                    format!("{NOT_A_STRUCT} with named fields"),
                ));
            }
        },
        Data::Enum(_) | Data::Union(_) => return Err(Error::new_spanned(input, NOT_A_STRUCT)),
    };

    check_duplicate_columns(&fields)?;

    Ok(RecordDef {
        name: input.ident.clone(),
        table: parse_table(input)?,
        fields,
        generics: input.generics.clone(),
    })
}

/// Read `#[rowbind(table = "...")]` from the struct attributes.
fn parse_table(input: &DeriveInput) -> Result<String> {
    let mut table = String::new();

    for attr in &input.attrs {
        if !attr.path().is_ident("rowbind") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                table = value.value();
                Ok(())
            } else {
                let attr_name = meta.path.to_token_stream().to_string();
                Err(meta.error(format!(
                    "unknown rowbind struct attribute `{attr_name}`. Valid attributes are: table"
                )))
            }
        })?;
    }

    Ok(table)
}

/// Parse one field; `None` when it carries no column.
fn parse_field(field: &Field) -> Result<Option<RecordFieldDef>> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "expected named field"))?;

    let mut column = None;
    let mut auto_increment = false;
    let mut readonly = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("rowbind") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let path = &meta.path;

            if path.is_ident("column") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(Error::new_spanned(value, "column name can not be empty"));
                }
                column = Some(value.value());
            } else if path.is_ident("default") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value() != "auto" {
                    return Err(Error::new_spanned(
                        value,
                        "the only supported default is \"auto\"",
                    ));
                }
                auto_increment = true;
            } else if path.is_ident("auto_increment") {
                auto_increment = true;
            } else if path.is_ident("readonly") {
                readonly = true;
            } else {
                let attr_name = path.to_token_stream().to_string();
                return Err(Error::new_spanned(
                    path,
                    format!(
                        "unknown rowbind field attribute `{attr_name}`. \
                         Valid attributes are: column, default, auto_increment, readonly"
                    ),
                ));
            }

            Ok(())
        })?;
    }

    let Some(column) = column else {
        if auto_increment || readonly {
            return Err(Error::new_spanned(
                field,
                "rowbind field options require a column, add `column = \"...\"`",
            ));
        }
        return Ok(None);
    };

    Ok(Some(RecordFieldDef {
        name,
        ty: field.ty.clone(),
        column,
        auto_increment,
        readonly,
    }))
}

fn check_duplicate_columns(fields: &[RecordFieldDef]) -> Result<()> {
    for (i, field) in fields.iter().enumerate() {
        if fields[..i].iter().any(|earlier| earlier.column == field.column) {
            return Err(Error::new_spanned(
                &field.name,
                format!("column `{}` is mapped more than once", field.column),
            ));
        }
    }
    Ok(())
}

/// Generate the `Record` trait implementation.
pub fn generate_record_impl(def: &RecordDef) -> TokenStream {
    let name = &def.name;
    let table = &def.table;
    let (impl_generics, ty_generics, where_clause) = def.generics.split_for_impl();
    let descriptors = def.fields.iter().map(generate_descriptor);

    quote! {
        impl #impl_generics ::rowbind_core::Record for #name #ty_generics #where_clause {
            fn table_name() -> &'static str {
                #table
            }

            fn field_descriptors() -> ::std::vec::Vec<::rowbind_core::FieldDescriptor<Self>> {
                ::std::vec![#(#descriptors),*]
            }
        }
    }
}

/// Generate the descriptor expression for a single field.
fn generate_descriptor(field: &RecordFieldDef) -> TokenStream {
    let ident = &field.name;
    let ty = &field.ty;
    let name = ident.to_string();
    let column = &field.column;

    let mut descriptor = quote! {
        ::rowbind_core::FieldDescriptor::new(
            #name,
            #column,
            <#ty as ::rowbind_core::FieldValue>::KIND,
            |record: &Self| ::rowbind_core::FieldValue::to_value(&record.#ident),
        )
    };

    if field.auto_increment {
        descriptor = quote! { #descriptor.auto_increment(true) };
    }

    if !field.readonly {
        descriptor = quote! {
            #descriptor.setter(
                |record: &mut Self, value: ::rowbind_core::Value| -> ::rowbind_core::Result<()> {
                    record.#ident = <#ty as ::rowbind_core::FieldValue>::from_value(value)?;
                    ::std::result::Result::Ok(())
                },
            )
        };
    }

    descriptor
}
