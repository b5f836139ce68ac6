//! thumbwatch turns images dropped into a folder into rounded-corner PNG thumbnails.
//!
//! # Pipeline overview
//!
//! 1. **Discover**: a startup scan ([`list_eligible`]) plus a non-recursive change
//!    subscription whose notifications are debounced per path ([`Debouncer`])
//! 2. **Transform**: decode, scale-to-cover and centre-crop, apply the anti-aliased
//!    rounded mask ([`build_mask`]), optionally stroke a border ([`transform`])
//! 3. **Finalize**: write `<stem>.png` and retire the source by deleting or archiving it
//!    ([`finalize`])
//!
//! Every job ends in a [`JobOutcome`]; failures before the write leave the source
//! untouched and never stop the watcher.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod config;
mod foundation;
mod lifecycle;
mod pipeline;
mod render;
mod scan;
mod watch;

pub use assets::decode::{decode_image, decode_image_file};
pub use config::{
    BorderSpec, Config, DEFAULT_DEBOUNCE_MS, DEFAULT_EXTENSIONS, DisposalPolicy, Size,
    has_allowed_extension, parse_rgba_hex,
};
pub use foundation::error::{ThumbError, ThumbResult};
pub use lifecycle::{
    ConversionJob, Disposal, OUTPUT_EXTENSION, archive, archive_destination, dispose, finalize,
    output_path_for, write_png,
};
pub use pipeline::{JobOutcome, Pipeline};
pub use render::mask::{SUPERSAMPLE, build_mask};
pub use render::transform::{apply_mask, fit_cover, transform};
pub use scan::list_eligible;
pub use watch::debounce::Debouncer;
pub use watch::events::{arrivals, eligible_arrivals};
pub use watch::service::WatchService;
