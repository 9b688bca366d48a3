// BEGIN - Embark standard lints v5 for Rust 1.55+
// do not change or add/remove here, but one can add exceptions after this section
// for more info see: <https://github.com/EmbarkStudios/rust-ecosystem/issues/59>
#![deny(unsafe_code)]
#![warn(
    clippy::all,
    clippy::await_holding_lock,
    clippy::char_lit_as_u8,
    clippy::checked_conversions,
    clippy::dbg_macro,
    clippy::debug_assert_with_mut_call,
    clippy::disallowed_methods,
    clippy::disallowed_types,
    clippy::doc_markdown,
    clippy::empty_enum,
    clippy::enum_glob_use,
    clippy::exit,
    clippy::expl_impl_clone_on_copy,
    clippy::explicit_deref_methods,
    clippy::explicit_into_iter_loop,
    clippy::fallible_impl_from,
    clippy::filter_map_next,
    clippy::flat_map_option,
    clippy::float_cmp_const,
    clippy::fn_params_excessive_bools,
    clippy::from_iter_instead_of_collect,
    clippy::if_let_mutex,
    clippy::implicit_clone,
    clippy::imprecise_flops,
    clippy::inefficient_to_string,
    clippy::invalid_upcast_comparisons,
    clippy::large_digit_groups,
    clippy::large_stack_arrays,
    clippy::large_types_passed_by_value,
    clippy::let_unit_value,
    clippy::linkedlist,
    clippy::lossy_float_literal,
    clippy::macro_use_imports,
    clippy::manual_ok_or,
    clippy::map_err_ignore,
    clippy::map_flatten,
    clippy::map_unwrap_or,
    clippy::match_on_vec_items,
    clippy::match_same_arms,
    clippy::match_wild_err_arm,
    clippy::match_wildcard_for_single_variants,
    clippy::mem_forget,
    clippy::missing_enforced_import_renames,
    clippy::mut_mut,
    clippy::mutex_integer,
    clippy::needless_borrow,
    clippy::needless_continue,
    clippy::needless_for_each,
    clippy::option_option,
    clippy::path_buf_push_overwrite,
    clippy::ptr_as_ptr,
    clippy::rc_mutex,
    clippy::ref_option_ref,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::same_functions_in_if_condition,
    clippy::semicolon_if_nothing_returned,
    clippy::single_match_else,
    clippy::string_add_assign,
    clippy::string_add,
    clippy::string_lit_as_bytes,
    clippy::string_to_string,
    clippy::todo,
    clippy::trait_duplication_in_bounds,
    clippy::unimplemented,
    clippy::unnested_or_patterns,
    clippy::unused_self,
    clippy::useless_transmute,
    clippy::verbose_file_reads,
    clippy::zero_sized_map_values,
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms
)]
// END - Embark standard lints v0.5 for Rust 1.55+
// crate-specific exceptions:
// `typed_to_bytes`/`any_as_u8_slice` reinterpret a typed slice as its byte
// representation; there is no safe cast for that.
#![allow(unsafe_code)]

//! Pure-Rust mesh optimization primitives for GPU rendering pipelines.
//!
//! Given an indexed (or unindexed) triangle mesh, this crate reorders
//! indices and vertices to improve post-transform vertex cache behavior
//! and reduce pixel overdraw, reorders vertices to improve pre-transform
//! fetch locality, and exposes hardware-agnostic analyzers that quantify
//! all three metrics. A typical pipeline:
//!
//! ```text
//! raw vertex stream
//!   -> generate_index_buffer + generate_vertex_buffer   (remap::*)
//!   -> optimize_vertex_cache_clusters                   (optimize::*)
//!   -> optimize_overdraw_in_place                       (optimize::*)
//!   -> optimize_vertex_fetch                            (optimize::*)
//! ```
//!
//! Analyzers ([`analyze_vertex_cache`], [`analyze_vertex_fetch`],
//! [`analyze_overdraw`]) can be invoked independently at any stage.
//!
//! All entry points here have total contracts over well-formed input:
//! non-triangular index counts, out-of-range indices and a zero
//! `vertex_size`/`vertex_stride` are caller bugs, not recoverable errors.
//! The one exception is [`VertexDataAdapter::new`], which validates the
//! shape of a borrowed byte buffer before handing back a view over it.

pub mod analyze;
pub mod error;
pub mod index;
pub mod optimize;
pub mod packing;
pub mod quantize;
pub mod remap;
pub mod utilities;
pub mod vecmath;

pub use crate::{
    analyze::*, error::*, index::*, optimize::*, packing::*, quantize::*, remap::*, utilities::*,
};
