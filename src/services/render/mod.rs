mod draw_list;
mod raster;

pub use self::draw_list::{
    build_draw_list, colors, format_label, DrawCommand, DrawList, RenderStyle, Rgba8,
};
pub use self::raster::{pack_argb, rasterize};
