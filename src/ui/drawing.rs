use gtk4 as gtk;

use gtk::DrawingArea;
use gtk4::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

use crate::ui::ViewState;

pub struct DrawingComponents {
    pub drawing_area: DrawingArea,
    pub placeholder_icon: gtk::Image,
}

pub fn create_drawing_area(state: &Rc<RefCell<ViewState>>) -> DrawingComponents {
    let drawing_area = DrawingArea::builder().hexpand(true).vexpand(true).build();

    setup_draw_function(&drawing_area, state);

    let placeholder_icon = gtk::Image::builder()
        .icon_name("image-x-generic-symbolic")
        .pixel_size(128)
        .opacity(0.2)
        .halign(gtk::Align::Center)
        .valign(gtk::Align::Center)
        .build();

    DrawingComponents {
        drawing_area,
        placeholder_icon,
    }
}

fn setup_draw_function(drawing_area: &DrawingArea, state: &Rc<RefCell<ViewState>>) {
    drawing_area.set_draw_func({
        let state = state.clone();
        move |_, cr, width, height| {
            draw_content(&state, cr, width, height);
        }
    });
}

fn draw_content(state: &Rc<RefCell<ViewState>>, cr: &gtk::cairo::Context, _width: i32, _height: i32) {
    let state = state.borrow();

    cr.set_source_rgb(0.14, 0.14, 0.14);
    cr.paint().expect("Invalid cairo surface state");

    if let Some(ref pixbuf) = state.preview_pixbuf {
        // The preview is already fitted to the viewport, so it is painted
        // at the origin with no extra scaling: widget coordinates are
        // preview pixel coordinates.
        cr.set_source_pixbuf(pixbuf, 0.0, 0.0);
        cr.paint().expect("Failed to paint pixbuf");

        draw_rectangles(&state, cr);
    }
}

fn draw_rectangles(state: &ViewState, cr: &gtk::cairo::Context) {
    cr.set_source_rgb(0.9, 0.15, 0.15);
    cr.set_line_width(2.0);

    for rect in state.session.committed() {
        stroke_rect(cr, rect.x1, rect.y1, rect.x2, rect.y2);
    }

    if let Some(pending) = state.session.pending() {
        stroke_rect(cr, pending.start_x, pending.start_y, pending.end_x, pending.end_y);
    }
}

fn stroke_rect(cr: &gtk::cairo::Context, x1: f64, y1: f64, x2: f64, y2: f64) {
    cr.rectangle(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs());
    let _ = cr.stroke();
}

/// Convert the preview image to a GDK Pixbuf for cairo painting
pub fn image_to_pixbuf(image: &image::DynamicImage) -> gtk::gdk_pixbuf::Pixbuf {
    let rgba = image.to_rgba8();
    let width = rgba.width() as i32;
    let height = rgba.height() as i32;
    let stride = width * 4;
    let pixels = rgba.into_raw();

    let bytes = gtk::glib::Bytes::from(&pixels);

    gtk::gdk_pixbuf::Pixbuf::from_bytes(
        &bytes,
        gtk::gdk_pixbuf::Colorspace::Rgb,
        true,
        8,
        width,
        height,
        stride,
    )
}
