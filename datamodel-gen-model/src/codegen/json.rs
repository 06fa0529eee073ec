use super::ident;
use crate::error::CompileResult;
use crate::members::{LENGTH, OFFSET};
use crate::naming;
use crate::plan::*;
use proc_macro2::TokenStream;
use quote::quote;

pub fn generate_serializer(plan: &SerializerPlan, model: &DataModel) -> CompileResult<TokenStream> {
    let node = ident(&model.nodes.name)?;
    let objects = plan
        .objects
        .iter()
        .map(|object| {
            let name = ident(&object.class)?;
            let type_name = &object.type_name;
            let body = match &object.body {
                JsonBody::Entries(entries) => {
                    let location = if object.write_locations {
                        let offset = ident(&naming::snake(OFFSET))?;
                        let length = ident(&naming::snake(LENGTH))?;
                        quote!(writer.write_location(self.#offset, self.#length);)
                    } else {
                        quote!()
                    };
                    let entries = entries
                        .iter()
                        .map(|entry| {
                            let key = &entry.key;
                            let field = ident(&naming::snake(&entry.property))?;
                            Ok(quote!(writer.write_property(#key, &self.#field);))
                        })
                        .collect::<CompileResult<Vec<_>>>()?;
                    quote! {
                        writer.begin_object(#type_name);
                        #location
                        #(#entries)*
                        writer.end_object();
                    }
                }
                JsonBody::DictionaryEntries => quote! {
                    writer.write_dictionary(#type_name, &self.entries);
                },
            };
            Ok(quote! {
                impl rt::WriteJson for #name {
                    fn write_json(&self, writer: &mut rt::JsonWriter) {
                        #body
                    }
                }

                impl #name {
                    pub fn to_json(&self) -> ::std::string::String {
                        rt::to_json(self)
                    }

                    pub fn from_json(text: &str) -> ::std::result::Result<Self, rt::DecodeError> {
                        rt::from_json::<#node, Self>(text)
                    }
                }
            })
        })
        .collect::<CompileResult<Vec<_>>>()?;

    Ok(quote! {
        #(#objects)*
    })
}
