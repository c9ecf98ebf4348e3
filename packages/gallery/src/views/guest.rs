use common::MediaKind;

use super::{escape_html, flash_banner, layout};
use crate::config::LimitsConfig;
use crate::utils::flash::Flash;

pub struct IndexView<'a> {
    pub flash: &'a Flash,
    pub limits: &'a LimitsConfig,
    pub public_url: &'a str,
    /// Inline SVG markup, or `None` if the code could not be rendered.
    pub qr_svg: Option<&'a str>,
}

pub fn index_page(view: &IndexView<'_>) -> String {
    let mut body = String::from("<h1>Share your photos and videos</h1>\n");
    body.push_str(&flash_banner(view.flash));

    for kind in MediaKind::ALL {
        body.push_str(&upload_form(kind, view.limits));
    }

    body.push_str(r#"<section class="qr"><h2>Invite others</h2>"#);
    if let Some(svg) = view.qr_svg {
        body.push_str(svg);
    }
    body.push_str(&format!(
        r#"<p><a href="{url}">{url}</a></p></section>"#,
        url = escape_html(view.public_url)
    ));

    layout("Guest gallery", &body)
}

fn upload_form(kind: MediaKind, limits: &LimitsConfig) -> String {
    let limits = limits.for_kind(kind);
    format!(
        r#"<section class="upload">
<h2>Upload {plural}</h2>
<form method="post" action="/upload/{plural}" enctype="multipart/form-data">
<label>Your name <input type="text" name="name" required maxlength="100"></label>
<input type="file" name="files" accept="{accept}*" multiple required>
<p class="hint">Up to {per_person} {plural} per person, {max_mb} MB each.</p>
<button type="submit">Upload</button>
</form>
</section>
"#,
        plural = kind.plural(),
        accept = kind.mime_prefix(),
        per_person = limits.per_person,
        max_mb = limits.max_file_size_mb,
    )
}
