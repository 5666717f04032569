pub mod drawing;
pub mod handlers;
pub mod header;

#[allow(unused_imports)]
pub use drawing::{create_drawing_area, image_to_pixbuf, DrawingComponents};
#[allow(unused_imports)]
pub use handlers::{connect_all_handlers, UiComponents};
#[allow(unused_imports)]
pub use header::{create_header_bar, HeaderComponents};

use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;
use gtk::Orientation;
use std::cell::RefCell;
use std::rc::Rc;

use crate::app::CropSession;

pub const WINDOW_TITLE: &str = "Multi-Crop";

/// State shared between the draw function and the event handlers: the
/// crop session itself plus the GDK copy of its preview.
pub struct ViewState {
    pub session: CropSession,
    pub preview_pixbuf: Option<gtk::gdk_pixbuf::Pixbuf>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            session: CropSession::new(),
            preview_pixbuf: None,
        }
    }
}

pub fn build_ui(app: &adw::Application) {
    let state = Rc::new(RefCell::new(ViewState::new()));

    let header = header::create_header_bar();
    let drawing = drawing::create_drawing_area(&state);

    let overlay = gtk::Overlay::builder().child(&drawing.drawing_area).build();
    overlay.add_overlay(&drawing.placeholder_icon);

    let content = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .build();
    content.append(&header.header_bar);
    content.append(&overlay);

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title(WINDOW_TITLE)
        .content(&content)
        .default_width(1100)
        .default_height(700)
        .build();

    let components = handlers::UiComponents {
        window: window.clone(),
        header,
        drawing,
    };

    handlers::connect_all_handlers(&state, &components);

    window.present();
}
