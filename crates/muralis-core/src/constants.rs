//! Application-wide constants.

use crate::models::VariantSize;

/// Object path prefix (relative to the upload base path) for master images and covers.
pub const ORIGIN_PREFIX: &str = "wallpapers/images/origin/";

/// Object path prefix for crops; each crop lands under `{CROP_PREFIX}{W}x{H}/`.
pub const CROP_PREFIX: &str = "wallpapers/images/crop/";

/// Object path prefix for packaged archives.
pub const ZIPS_PREFIX: &str = "wallpapers/zips/";

/// Thumbnail used for listing pages.
pub const COVER_SIZE: VariantSize = VariantSize::new(120, 100);

/// Supported crop sizes, one per device class. Every completed asset carries
/// exactly one stored crop per entry.
pub const VARIANT_SIZES: [VariantSize; 8] = [
    VariantSize::new(120, 100),
    VariantSize::new(160, 133),
    VariantSize::new(240, 200),
    VariantSize::new(320, 266),
    VariantSize::new(360, 300),
    VariantSize::new(480, 400),
    VariantSize::new(460, 383),
    VariantSize::new(144, 120),
];

/// Exact pixel dimensions every single upload must have.
pub const REQUIRED_WIDTH: u32 = 960;
pub const REQUIRED_HEIGHT: u32 = 800;

/// Masters larger than this are re-encoded before anything else happens.
pub const COMPRESS_THRESHOLD_BYTES: u64 = 200 * 1024;
pub const COMPRESS_QUALITY: u8 = 80;

/// Extensions accepted for a single image upload.
pub const ACCEPTED_IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Extension accepted for a batch upload.
pub const BATCH_ARCHIVE_EXTENSION: &str = "zip";

pub const DEFAULT_ASSET_SOURCE: &str = "baibian";
pub const DEFAULT_ASSET_NAME: &str = "Phone wallpaper";
pub const DEFAULT_ASSET_AUTHOR: &str = "From the internet";

/// Launcher packages an asset targets when the caller does not say otherwise.
pub const DEFAULT_TARGET_PACKAGES: [&str; 2] = ["ilauncher", "launcher"];

pub const DEFAULT_PUBLIC_BUCKET: &str = "noauth";
