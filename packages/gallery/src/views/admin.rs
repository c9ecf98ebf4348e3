use common::MediaKind;

use super::{escape_html, flash_banner, layout};
use crate::models::media::{KindSection, MediaItem, format_size};
use crate::utils::flash::Flash;

pub fn login_page(flash: &Flash) -> String {
    let body = format!(
        r#"<h1>Admin login</h1>
{flash}
<form method="post" action="/admin/login">
<label>Username <input type="text" name="username" autocomplete="username" required></label>
<label>Password <input type="password" name="password" autocomplete="current-password" required></label>
<button type="submit">Log in</button>
</form>
"#,
        flash = flash_banner(flash),
    );
    layout("Admin login", &body)
}

pub fn admin_page(username: &str, flash: &Flash, sections: &[KindSection]) -> String {
    let mut body = format!(
        r#"<header class="admin-bar"><h1>Gallery admin</h1>
<form method="post" action="/admin/logout"><span>{user}</span> <button type="submit">Log out</button></form>
</header>
"#,
        user = escape_html(username),
    );
    body.push_str(&flash_banner(flash));
    for section in sections {
        body.push_str(&kind_section(section));
    }
    layout("Gallery admin", &body)
}

fn kind_section(section: &KindSection) -> String {
    let plural = section.kind.plural();
    let mut out = format!(
        r#"<section class="kind">
<h2>{title}s <small>{count} / {total}</small></h2>
<p class="hint">Per person limit: {per_person}</p>
<p class="actions">
<a href="/admin/{plural}/download">Download all</a>
<form method="post" action="/admin/{plural}/delete-all" class="inline"><button type="submit">Delete all {plural}</button></form>
</p>
"#,
        title = section.kind.title(),
        count = section.count,
        total = section.limits.total,
        per_person = section.limits.per_person,
    );

    if section.items.is_empty() {
        out.push_str(&format!("<p>No {plural} yet.</p>\n"));
    } else {
        out.push_str(
            "<table>\n<tr><th></th><th>From</th><th>File</th><th>Size</th><th>Uploaded</th><th></th></tr>\n",
        );
        for item in &section.items {
            out.push_str(&item_row(section.kind, item));
        }
        out.push_str("</table>\n");
    }
    out.push_str("</section>\n");
    out
}

fn item_row(kind: MediaKind, item: &MediaItem) -> String {
    let href = format!("/admin/{}/{}", kind.plural(), item.id);
    let preview = match kind {
        MediaKind::Photo => format!(r#"<img src="{href}" alt="" loading="lazy">"#),
        MediaKind::Video => format!(r#"<video src="{href}" preload="metadata" controls></video>"#),
    };
    format!(
        r#"<tr><td>{preview}</td><td>{from}</td><td><a href="{href}">{name}</a></td><td>{size}</td><td>{at}</td>
<td><form method="post" action="{href}/delete"><button type="submit">Delete</button></form></td></tr>
"#,
        from = escape_html(&item.uploader_name),
        name = escape_html(&item.original_name),
        size = format_size(item.size_bytes),
        at = item.uploaded_at.format("%Y-%m-%d %H:%M"),
    )
}
