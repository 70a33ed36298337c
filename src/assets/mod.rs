/// Basemap providers.
pub mod basemap;
/// Image decoding into premultiplied rasters.
pub mod decode;
/// Font selection for overlays.
pub mod fonts;
