use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;

pub struct HeaderComponents {
    pub header_bar: adw::HeaderBar,
    pub open_btn: gtk::Button,
    pub export_btn: gtk::Button,
}

pub fn create_header_bar() -> HeaderComponents {
    let open_btn = gtk::Button::builder()
        .label("Open Image")
        .icon_name("document-open-symbolic")
        .build();
    open_btn.add_css_class("suggested-action");

    // Stays insensitive until the first image loads
    let export_btn = gtk::Button::builder()
        .label("Export Crops")
        .icon_name("document-save-symbolic")
        .sensitive(false)
        .build();

    let header_bar = adw::HeaderBar::new();
    header_bar.pack_start(&open_btn);
    header_bar.pack_end(&export_btn);

    HeaderComponents {
        header_bar,
        open_btn,
        export_btn,
    }
}
