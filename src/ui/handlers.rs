use gtk::glib;
use gtk4 as gtk;
use libadwaita as adw;
use log::{debug, error, info, warn};

use gtk::GestureDrag;
use gtk4::prelude::*;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::ui::drawing::{image_to_pixbuf, DrawingComponents};
use crate::ui::header::HeaderComponents;
use crate::ui::{ViewState, WINDOW_TITLE};

pub struct UiComponents {
    pub window: adw::ApplicationWindow,
    pub header: HeaderComponents,
    pub drawing: DrawingComponents,
}

pub fn connect_all_handlers(state: &Rc<RefCell<ViewState>>, components: &UiComponents) {
    connect_open_handler(state, components);
    connect_export_handler(state, components);
    connect_drag_handlers(state, components);
}

pub fn connect_open_handler(state: &Rc<RefCell<ViewState>>, components: &UiComponents) {
    components.header.open_btn.connect_clicked({
        let state = state.clone();
        let window = components.window.clone();
        let drawing_area = components.drawing.drawing_area.clone();
        let placeholder_icon = components.drawing.placeholder_icon.clone();
        let export_btn = components.header.export_btn.clone();

        move |_| {
            let state = state.clone();
            let window = window.clone();
            let drawing_area = drawing_area.clone();
            let placeholder_icon = placeholder_icon.clone();
            let export_btn = export_btn.clone();

            glib::spawn_future_local(async move {
                let filter = gtk::FileFilter::new();
                filter.set_name(Some("Image Files"));
                filter.add_pattern("*.png");
                filter.add_pattern("*.jpg");
                filter.add_pattern("*.jpeg");

                let filters = gtk::gio::ListStore::new::<gtk::FileFilter>();
                filters.append(&filter);

                let dialog = gtk::FileDialog::builder()
                    .title("Open Image")
                    .filters(&filters)
                    .build();

                match dialog.open_future(Some(&window)).await {
                    Ok(file) => {
                        if let Some(path) = file.path() {
                            load_image_from_path(
                                &state,
                                &window,
                                &drawing_area,
                                &placeholder_icon,
                                &export_btn,
                                &path,
                            );
                        }
                    }
                    Err(_) => {
                        // Dialog dismissed
                        debug!("Open dialog cancelled");
                    }
                }
            });
        }
    });
}

fn load_image_from_path(
    state: &Rc<RefCell<ViewState>>,
    window: &adw::ApplicationWindow,
    drawing_area: &gtk::DrawingArea,
    placeholder_icon: &gtk::Image,
    export_btn: &gtk::Button,
    path: &Path,
) {
    // The preview is fitted to the viewport as it is at load time; later
    // resizes do not change the scale factor for this session.
    let viewport_width = drawing_area.width().max(1) as u32;
    let viewport_height = drawing_area.height().max(1) as u32;

    let mut s = state.borrow_mut();
    match s.session.load_image(path, viewport_width, viewport_height) {
        Ok(()) => {
            s.preview_pixbuf = s.session.preview().map(image_to_pixbuf);
            let title = match s.session.file_name() {
                Some(name) => format!("{} — {}", WINDOW_TITLE, name),
                None => WINDOW_TITLE.to_string(),
            };
            info!(
                "Loaded {} (scale factor {:.3})",
                path.display(),
                s.session.scale().unwrap_or(1.0)
            );
            drop(s);

            window.set_title(Some(&title));
            export_btn.set_sensitive(true);
            placeholder_icon.set_visible(false);
            drawing_area.queue_draw();
        }
        Err(e) => {
            drop(s);
            error!("Failed to load {}: {}", path.display(), e);
        }
    }
}

pub fn connect_export_handler(state: &Rc<RefCell<ViewState>>, components: &UiComponents) {
    components.header.export_btn.connect_clicked({
        let state = state.clone();
        move |_| {
            let dir = match std::env::current_dir() {
                Ok(dir) => dir,
                Err(e) => {
                    error!("Cannot resolve working directory: {}", e);
                    return;
                }
            };

            let s = state.borrow();
            match s.session.export_crops(&dir) {
                Ok(report) => {
                    info!(
                        "Exported {} crop(s) to {}",
                        report.written.len(),
                        dir.display()
                    );
                    for (index, e) in &report.skipped {
                        warn!("Crop {} skipped: {}", index, e);
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
    });
}

pub fn connect_drag_handlers(state: &Rc<RefCell<ViewState>>, components: &UiComponents) {
    debug!("Connecting drag handlers");
    let drag = GestureDrag::new();

    drag.connect_drag_begin({
        let state = state.clone();
        let drawing_area = components.drawing.drawing_area.clone();
        move |_, x, y| {
            handle_drag_begin(&state, &drawing_area, x, y);
        }
    });

    drag.connect_drag_update({
        let state = state.clone();
        let drawing_area = components.drawing.drawing_area.clone();
        move |_, offset_x, offset_y| {
            handle_drag_update(&state, &drawing_area, offset_x, offset_y);
        }
    });

    drag.connect_drag_end({
        let state = state.clone();
        let drawing_area = components.drawing.drawing_area.clone();
        move |_, offset_x, offset_y| {
            handle_drag_end(&state, &drawing_area, offset_x, offset_y);
        }
    });

    components.drawing.drawing_area.add_controller(drag);
}

fn handle_drag_begin(state: &Rc<RefCell<ViewState>>, drawing_area: &gtk::DrawingArea, x: f64, y: f64) {
    let mut s = state.borrow_mut();
    match s.session.begin_rect(x, y) {
        Ok(()) => {
            drop(s);
            drawing_area.queue_draw();
        }
        Err(e) => debug!("Ignoring drag: {}", e),
    }
}

fn handle_drag_update(
    state: &Rc<RefCell<ViewState>>,
    drawing_area: &gtk::DrawingArea,
    offset_x: f64,
    offset_y: f64,
) {
    let mut s = state.borrow_mut();
    let Some(pending) = s.session.pending() else {
        return;
    };

    // GestureDrag reports offsets relative to the drag origin
    let x = pending.start_x + offset_x;
    let y = pending.start_y + offset_y;

    if s.session.update_rect(x, y).is_ok() {
        drop(s);
        drawing_area.queue_draw();
    }
}

fn handle_drag_end(
    state: &Rc<RefCell<ViewState>>,
    drawing_area: &gtk::DrawingArea,
    offset_x: f64,
    offset_y: f64,
) {
    let mut s = state.borrow_mut();
    let Some(pending) = s.session.pending() else {
        return;
    };

    let x = pending.start_x + offset_x;
    let y = pending.start_y + offset_y;

    if s.session.commit_rect(x, y).is_ok() {
        debug!("Committed rectangle {}", s.session.rect_count());
        drop(s);
        drawing_area.queue_draw();
    }
}
