use super::{element_type, ident, Names};
use crate::error::CompileResult;
use crate::naming;
use crate::plan::*;
use proc_macro2::{Ident, TokenStream};
use quote::quote;

fn step_field(step: &VisitStep) -> CompileResult<Ident> {
    ident(&naming::snake(&step.property))
}

/// Dispatch arms for the discriminants a live node can carry.
fn concrete_arms(plan: &VisitorPlan) -> CompileResult<Vec<(Ident, Ident)>> {
    plan.arms
        .iter()
        .filter(|arm| !arm.is_abstract)
        .map(|arm| Ok((ident(&arm.class)?, ident(&arm.method)?)))
        .collect()
}

/// The read-only visitor. Every method visits the node children, then
/// converts the node itself into the result.
pub fn generate_visitor(plan: &VisitorPlan, names: &Names) -> CompileResult<TokenStream> {
    let name = ident(&plan.name)?;
    let Names { node_ref, .. } = names;
    let (classes, arm_methods): (Vec<_>, Vec<_>) = concrete_arms(plan)?.into_iter().unzip();

    let methods = plan
        .methods
        .iter()
        .map(|m| {
            let class = ident(&m.class)?;
            let method = ident(&m.method)?;
            let body = match &m.body {
                VisitBody::Properties(steps) => {
                    let steps = steps
                        .iter()
                        .map(|step| {
                            let field = step_field(step)?;
                            Ok(match step.cardinality {
                                Cardinality::Single => quote! {
                                    if let ::std::option::Option::Some(child) = &node.#field {
                                        let _: T = self.visit(#node_ref::from(&**child));
                                    }
                                },
                                Cardinality::List => quote! {
                                    for child in &node.#field {
                                        let _: T = self.visit(#node_ref::from(child));
                                    }
                                },
                            })
                        })
                        .collect::<CompileResult<Vec<_>>>()?;
                    quote! {
                        #(#steps)*
                        T::from(#node_ref::from(node))
                    }
                }
                VisitBody::DictionaryValues { .. } => quote! {
                    for child in node.entries.values() {
                        let _: T = self.visit(#node_ref::from(child));
                    }
                    T::from(#node_ref::from(node))
                },
                VisitBody::CastThrough { subclasses } => {
                    let (subs, sub_methods) = cast_through(subclasses)?;
                    quote! {
                        match node {
                            #(#class::#subs(n) => self.#sub_methods(n),)*
                        }
                    }
                }
            };
            Ok(quote! {
                fn #method(&mut self, node: &'ast #class) -> T {
                    #body
                }
            })
        })
        .collect::<CompileResult<Vec<_>>>()?;

    Ok(quote! {
        /// Read-only traversal. Override a `visit_*` method to intercept one
        /// node type; call `visit` on children to keep the traversal going.
        pub trait #name<'ast, T>: Sized
        where
            T: ::std::convert::From<#node_ref<'ast>>,
        {
            fn visit(&mut self, node: #node_ref<'ast>) -> T {
                self.visit_actual(node)
            }

            fn visit_actual(&mut self, node: #node_ref<'ast>) -> T {
                match node {
                    #(#node_ref::#classes(n) => self.#arm_methods(n),)*
                }
            }

            #(#methods)*
        }
    })
}

fn cast_through(subclasses: &[(String, String)]) -> CompileResult<(Vec<Ident>, Vec<Ident>)> {
    Ok(subclasses
        .iter()
        .map(|(sub, method)| Ok((ident(sub)?, ident(method)?)))
        .collect::<CompileResult<Vec<_>>>()?
        .into_iter()
        .unzip())
}

/// The rewriting visitor. Every method takes a node by value and returns its
/// replacement. Children go back through `visit`, so the generic hook sees
/// every node; a replacement of the wrong type for its slot is dropped.
pub fn generate_rewriting_visitor(plan: &VisitorPlan, names: &Names) -> CompileResult<TokenStream> {
    let name = ident(&plan.name)?;
    let Names { node, .. } = names;
    let (classes, arm_methods): (Vec<_>, Vec<_>) = concrete_arms(plan)?.into_iter().unzip();

    let methods = plan
        .methods
        .iter()
        .map(|m| {
            let class = ident(&m.class)?;
            let method = ident(&m.method)?;
            let body = match &m.body {
                VisitBody::Properties(steps) => {
                    let steps = steps
                        .iter()
                        .map(|step| {
                            let field = step_field(step)?;
                            let ty = element_type(&step.element)?;
                            Ok(match step.cardinality {
                                Cardinality::Single => quote! {
                                    node.#field = node.#field.and_then(|child| {
                                        rt::rewritten::<#node, #ty>(self.visit(#node::from(*child)))
                                            .map(::std::boxed::Box::new)
                                    });
                                },
                                Cardinality::List => quote! {
                                    node.#field = node
                                        .#field
                                        .into_iter()
                                        .filter_map(|child| rt::rewritten::<#node, #ty>(self.visit(#node::from(child))))
                                        .collect();
                                },
                            })
                        })
                        .collect::<CompileResult<Vec<_>>>()?;
                    quote! {
                        let mut node = node;
                        #(#steps)*
                        node
                    }
                }
                VisitBody::DictionaryValues { element } => {
                    let ty = element_type(element)?;
                    quote! {
                        let mut node = node;
                        node.entries = node
                            .entries
                            .filter_map_values(|child| rt::rewritten::<#node, #ty>(self.visit(#node::from(child))));
                        node
                    }
                }
                VisitBody::CastThrough { subclasses } => {
                    let (subs, sub_methods) = cast_through(subclasses)?;
                    quote! {
                        match node {
                            #(#class::#subs(n) => #class::#subs(self.#sub_methods(n)),)*
                        }
                    }
                }
            };
            Ok(quote! {
                fn #method(&mut self, node: #class) -> #class {
                    #body
                }
            })
        })
        .collect::<CompileResult<Vec<_>>>()?;

    Ok(quote! {
        /// Rebuilding traversal. The default implementation returns a tree
        /// equal to its input.
        pub trait #name: Sized {
            fn visit(&mut self, node: #node) -> #node {
                self.visit_actual(node)
            }

            fn visit_actual(&mut self, node: #node) -> #node {
                match node {
                    #(#node::#classes(n) => #node::#classes(self.#arm_methods(n)),)*
                }
            }

            #(#methods)*
        }
    })
}
