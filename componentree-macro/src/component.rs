use darling::ast::{Data, Style};
use darling::util::{Ignored, Override};
use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, DeriveInput, Generics, Ident, Type};

#[derive(FromDeriveInput)]
#[darling(attributes(component), supports(struct_named, struct_unit))]
struct ComponentArgs {
    ident: Ident,
    generics: Generics,
    data: Data<Ignored, ParamField>,
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    service: bool,
    #[darling(multiple)]
    tag: Vec<String>,
    #[darling(multiple)]
    implements: Vec<String>,
    #[darling(multiple)]
    init: Vec<String>,
    #[darling(default)]
    parameter_source: bool,
    #[darling(default)]
    base: Option<String>,
}

#[derive(FromField)]
#[darling(attributes(param))]
struct ParamField {
    ident: Option<Ident>,
    ty: Type,
    #[darling(default)]
    inject: Option<Override<String>>,
    #[darling(default)]
    data: Option<Override<String>>,
    #[darling(default)]
    source: Option<String>,
}

pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = ComponentArgs::from_derive_input(&input)
        .and_then(|args| generate_component_impl(&args))
        .unwrap_or_else(|err| err.write_errors());
    TokenStream::from(expanded)
}

fn generate_component_impl(args: &ComponentArgs) -> darling::Result<TokenStream2> {
    let struct_name = &args.ident;

    if !args.generics.params.is_empty() {
        return Err(darling::Error::custom(
            "#[derive(Component)] does not support generic structs",
        )
        .with_span(&args.generics));
    }

    let fields = match &args.data {
        Data::Struct(fields) => fields,
        Data::Enum(_) => {
            return Err(darling::Error::custom(
                "#[derive(Component)] can only be applied to structs",
            ))
        }
    };

    let mut errors = darling::Error::accumulator();
    let mut specs = Vec::new();
    let mut values = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let Some(field_name) = &field.ident else {
            continue;
        };
        if let Some((spec, value)) = errors.handle(field_parameter(field_name, field, index)) {
            specs.push(spec);
            values.push(value);
        }
    }
    errors.finish()?;

    let name = args
        .name
        .clone()
        .unwrap_or_else(|| struct_name.to_string());

    let service = args.service.then(|| quote!(.service()));
    let tags = &args.tag;
    let capabilities = &args.implements;
    let parameter_source = args
        .parameter_source
        .then(|| quote!(.parameter_source::<Self>()));

    let initializers = args.init.iter().map(|method| {
        let method_ident = format_ident!("{}", method);
        quote! {
            .initializer(#method, |this: ::std::sync::Arc<Self>| async move {
                this.#method_ident()
                    .await
                    .map_err(::std::convert::Into::<::componentree::anyhow::Error>::into)
            })
        }
    });

    let construct = if fields.style == Style::Unit {
        quote!(Ok(Self))
    } else {
        quote!(Ok(Self { #(#values),* }))
    };

    let registration = args.base.as_ref().map(|base| {
        quote! {
            ::componentree::inventory::submit! {
                ::componentree::loader::Registration::new(
                    #base,
                    ::core::module_path!(),
                    <#struct_name as ::componentree::Component>::descriptor,
                )
            }
        }
    });

    Ok(quote! {
        impl ::componentree::Component for #struct_name {
            const NAME: &'static str = #name;

            fn parameters() -> ::std::vec::Vec<::componentree::ParamSpec> {
                ::std::vec![#(#specs),*]
            }

            fn declare(
                builder: ::componentree::DescriptorBuilder,
            ) -> ::componentree::DescriptorBuilder {
                builder
                    #service
                    #(.tag(#tags))*
                    #(.implements(#capabilities))*
                    #parameter_source
                    #(#initializers)*
                    .source(::core::module_path!())
            }

            #[allow(unused_variables)]
            fn construct(
                args: &::componentree::Arguments,
            ) -> ::componentree::Result<Self> {
                #construct
            }
        }

        #registration
    })
}

/// The `ParamSpec` expression and the field initializer for one field
fn field_parameter(
    field_name: &Ident,
    field: &ParamField,
    index: usize,
) -> darling::Result<(TokenStream2, TokenStream2)> {
    let field_type = &field.ty;

    match (&field.inject, &field.data) {
        (Some(inject), None) => {
            if field.source.is_some() {
                return Err(darling::Error::custom(
                    "`source` only applies to #[param(data)] fields",
                )
                .with_span(field_name));
            }

            let inner = extract_injectable_type(field_type).ok_or_else(|| {
                darling::Error::custom("#[param(inject)] fields must be of type Arc<T>")
                    .with_span(field_type)
            })?;
            if let Type::TraitObject(_) = inner {
                return Err(darling::Error::custom(
                    "trait objects cannot be injected directly; inject the concrete component",
                )
                .with_span(field_type));
            }

            let target = match inject {
                Override::Explicit(name) => quote!(#name),
                Override::Inherit => quote!(<#inner as ::componentree::Component>::NAME),
            };
            Ok((
                quote!(::componentree::ParamSpec::inject(#target)),
                quote!(#field_name: args.component::<#inner>(#index)?),
            ))
        }
        (None, Some(data)) => {
            let name = match data {
                Override::Explicit(name) => name.clone(),
                Override::Inherit => field_name.to_string(),
            };
            let spec = match &field.source {
                Some(source) => quote!(::componentree::ParamSpec::data_from(#name, #source)),
                None => quote!(::componentree::ParamSpec::data(#name)),
            };
            Ok((spec, quote!(#field_name: args.data::<#field_type>(#index)?)))
        }
        (Some(_), Some(_)) => Err(darling::Error::custom(
            "a field cannot be both #[param(inject)] and #[param(data)]",
        )
        .with_span(field_name)),
        (None, None) => Err(darling::Error::custom(format!(
            "field `{field_name}` needs #[param(inject)] or #[param(data)]"
        ))
        .with_span(field_name)),
    }
}

/// Extract the inner type from Arc<T>
fn extract_injectable_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Arc" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(inner_type)) = args.args.first() {
                        return Some(inner_type);
                    }
                }
            }
        }
    }
    None
}
