use std::collections::BTreeMap;
use std::env;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use serde::Serialize;
use storybook::{Catalog, DirSource};
use storybook_render::{Page, TocEntry, Viewer, ViewerConfig, ViewerSnapshot};
use storybook_render_web::covers::{self, CompressOptions};
use storybook_render_web::{image_data_uri, mime_from_path, parse_input, preview, WebInput};

const DEFAULT_STORIES_DIR: &str = "stories";
const DEFAULT_OUT_PATH: &str = "target/web-preview/index.html";
const DEFAULT_PORT: u16 = 42818;
const MAX_COVER_BYTES: usize = 8 * 1024 * 1024;

#[derive(Clone, Debug)]
struct Args {
    stories_dir: String,
    catalog_path: Option<String>,
    config_path: Option<String>,
    out_path: String,
    serve: bool,
    compress_covers: bool,
    max_width: u32,
    port: u16,
    width: Option<i32>,
    height: Option<i32>,
}

/// Everything the standalone HTML needs to page through stories offline.
#[derive(Debug, Serialize)]
struct StaticPayload {
    version: &'static str,
    transition_ms: u64,
    pages: Vec<Page>,
    toc: Vec<TocEntry>,
    covers: BTreeMap<u32, String>,
    titles: BTreeMap<u32, String>,
}

#[derive(Debug, Serialize)]
struct StatePayload<'a> {
    #[serde(flatten)]
    snapshot: ViewerSnapshot,
    transition_ms: u64,
    resize_debounce_ms: u64,
    titles: &'a BTreeMap<u32, String>,
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    query: String,
}

struct Preview {
    viewer: Viewer,
    stories_dir: PathBuf,
    titles: BTreeMap<u32, String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let cli = parse_args(args)?;
    if cli.compress_covers {
        return compress_covers(&cli);
    }
    let mut preview = build_preview(&cli)?;

    if cli.serve {
        return run_server(&mut preview, cli.port);
    }

    if cli.out_path.is_empty() {
        return Err("--out must not be empty".to_string());
    }
    if let Some(parent) = Path::new(&cli.out_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
    }

    let payload = static_payload(&preview);
    let data_json = serde_json::to_string(&payload).map_err(|e| e.to_string())?;
    let html = build_html(&data_json, false);
    std::fs::write(&cli.out_path, html).map_err(|e| e.to_string())?;

    println!(
        "wrote web preview to {} (pages={}, stories={}, covers={})",
        cli.out_path,
        payload.pages.len(),
        payload.toc.len(),
        payload.covers.len(),
    );
    Ok(())
}

fn compress_covers(cli: &Args) -> Result<(), String> {
    let opts = CompressOptions {
        max_width: cli.max_width,
        ..CompressOptions::default()
    };
    let report = covers::compress_story_covers(Path::new(&cli.stories_dir), &opts)
        .map_err(|e| e.to_string())?;
    println!(
        "compressed covers in {}/image (resized={}, copied={}, failed={})",
        cli.stories_dir, report.resized, report.copied, report.failed
    );
    Ok(())
}

fn build_preview(cli: &Args) -> Result<Preview, String> {
    let mut config = match &cli.config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read config '{}': {}", path, e))?;
            ViewerConfig::from_json_str(&text).map_err(|e| e.to_string())?
        }
        None => ViewerConfig::default(),
    };
    if let Some(width) = cli.width {
        config.viewport.width = width;
    }
    if let Some(height) = cli.height {
        config.viewport.height = height;
    }
    config.validate().map_err(|e| e.to_string())?;

    let stories_dir = PathBuf::from(&cli.stories_dir);
    let catalog = match &cli.catalog_path {
        Some(path) => Catalog::from_json_file(path).map_err(|e| e.to_string())?,
        None if stories_dir.is_dir() => {
            let discovered = Catalog::discover(&stories_dir).map_err(|e| e.to_string())?;
            if discovered.is_empty() {
                log::warn!(
                    "no story files in {}, using the default catalog",
                    stories_dir.display()
                );
                Catalog::default_set()
            } else {
                discovered
            }
        }
        None => Catalog::default_set(),
    };
    let titles = catalog
        .stories()
        .iter()
        .map(|story| (story.id, story.title.clone()))
        .collect();

    let mut viewer = Viewer::with_heuristic_oracle(config, catalog.into_stories());
    let report = viewer.load(&DirSource::new(&stories_dir));
    log::info!(
        "preview ready: stories={} loaded={} failed={} pages={}",
        viewer.stories().len(),
        report.loaded,
        report.failed,
        viewer.sequence().len()
    );
    Ok(Preview {
        viewer,
        stories_dir,
        titles,
    })
}

fn static_payload(preview: &Preview) -> StaticPayload {
    let mut covers = BTreeMap::new();
    for story in preview.viewer.stories() {
        if let Some(uri) = read_cover(&preview.stories_dir, &story.cover_image_ref)
            .map(|bytes| image_data_uri(&story.cover_image_ref, &bytes))
        {
            covers.insert(story.id, uri);
        }
    }
    StaticPayload {
        version: preview::VERSION,
        transition_ms: preview.viewer.config().transition_ms,
        pages: preview.viewer.sequence().pages().to_vec(),
        toc: preview.viewer.sequence().toc_entries().to_vec(),
        covers,
        titles: preview.titles.clone(),
    }
}

fn read_cover(stories_dir: &Path, cover_ref: &str) -> Option<Vec<u8>> {
    let relative = Path::new(cover_ref);
    if cover_ref.is_empty()
        || !relative
            .components()
            .all(|part| matches!(part, Component::Normal(_)))
    {
        log::warn!("rejected cover path '{}'", cover_ref);
        return None;
    }
    let path = stories_dir.join(cover_ref);
    match std::fs::read(&path) {
        Ok(bytes) if bytes.len() <= MAX_COVER_BYTES => Some(bytes),
        Ok(bytes) => {
            log::warn!(
                "skipped cover '{}' because it exceeded max bytes ({} > {})",
                cover_ref,
                bytes.len(),
                MAX_COVER_BYTES
            );
            None
        }
        Err(err) => {
            log::warn!("unable to read cover '{}': {}", path.display(), err);
            None
        }
    }
}

fn run_server(preview: &mut Preview, port: u16) -> Result<(), String> {
    let listener = TcpListener::bind(("127.0.0.1", port)).map_err(|e| e.to_string())?;
    listener.set_nonblocking(false).map_err(|e| e.to_string())?;

    let addr = listener.local_addr().map_err(|e| e.to_string())?;
    let html = build_html("null", true);
    let url = format!("http://{}:{}/", addr.ip(), addr.port());

    println!("serving web preview at {}", url);

    for incoming in listener.incoming() {
        let mut stream = match incoming {
            Ok(stream) => stream,
            Err(err) => {
                log::warn!("accept error: {}", err);
                continue;
            }
        };
        if let Err(err) = stream.set_read_timeout(Some(Duration::from_secs(15))) {
            log::warn!("set timeout failed: {}", err);
        }
        if let Err(err) = handle_connection(&mut stream, preview, &html) {
            log::warn!("request error: {}", err);
        }
    }

    Ok(())
}

fn handle_connection(
    stream: &mut TcpStream,
    preview: &mut Preview,
    html: &str,
) -> Result<(), String> {
    let req = read_http_request(stream)?;
    let now = Instant::now();
    preview.viewer.tick(now);

    match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/") => write_http_response(
            stream,
            "200 OK",
            "text/html; charset=utf-8",
            html.as_bytes(),
        ),
        ("GET", "/api/state") => write_state(stream, preview),
        ("GET", "/api/input") => match parse_input(&req.query) {
            Ok(WebInput::Event(event)) => {
                let result = preview.viewer.handle_input(event, now);
                log::debug!("input {:?} -> {:?}", event, result.navigation);
                write_state(stream, preview)
            }
            Ok(WebInput::Resize(viewport)) => {
                if viewport != preview.viewer.viewport() {
                    preview.viewer.resize(viewport, now);
                }
                write_state(stream, preview)
            }
            Err(err) => {
                let body = serde_json::to_vec(&serde_json::json!({ "error": err }))
                    .map_err(|e| e.to_string())?;
                write_http_response(stream, "400 Bad Request", "application/json", &body)
            }
        },
        ("GET", "/api/cover") => {
            let id = storybook_render_web::parse_query(&req.query)
                .get("id")
                .and_then(|v| v.parse::<u32>().ok());
            let cover = id
                .and_then(|id| preview.viewer.story(id))
                .map(|story| story.cover_image_ref.clone())
                .and_then(|cover_ref| {
                    read_cover(&preview.stories_dir, &cover_ref).map(|bytes| (cover_ref, bytes))
                });
            match cover {
                Some((cover_ref, bytes)) => {
                    let mime = mime_from_path(&cover_ref).unwrap_or("application/octet-stream");
                    write_http_response(stream, "200 OK", mime, &bytes)
                }
                None => write_http_response(
                    stream,
                    "404 Not Found",
                    "application/json",
                    br#"{"error":"no_cover"}"#,
                ),
            }
        }
        ("GET", "/favicon.ico") => write_http_response(stream, "204 No Content", "text/plain", &[]),
        _ => write_http_response(
            stream,
            "404 Not Found",
            "application/json",
            br#"{"error":"not_found"}"#,
        ),
    }
}

fn write_state(stream: &mut TcpStream, preview: &Preview) -> Result<(), String> {
    let payload = StatePayload {
        snapshot: preview.viewer.snapshot(),
        transition_ms: preview.viewer.config().transition_ms,
        resize_debounce_ms: preview.viewer.config().resize_debounce_ms,
        titles: &preview.titles,
    };
    let body = serde_json::to_vec(&payload).map_err(|e| e.to_string())?;
    write_http_response(stream, "200 OK", "application/json", &body)
}

fn read_http_request(stream: &mut TcpStream) -> Result<HttpRequest, String> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 1024];
    let mut header_end = None;

    while header_end.is_none() {
        let n = stream.read(&mut chunk).map_err(|e| e.to_string())?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        header_end = find_header_end(&buf);
        if buf.len() > 64 * 1024 {
            return Err("request header too large".to_string());
        }
    }

    let header_end = header_end.ok_or_else(|| "incomplete http request".to_string())?;
    let header_text = String::from_utf8_lossy(&buf[..header_end]);
    let request_line = header_text
        .split("\r\n")
        .next()
        .ok_or_else(|| "missing request line".to_string())?;

    let mut req_parts = request_line.split_whitespace();
    let method = req_parts
        .next()
        .ok_or_else(|| "missing method".to_string())?
        .to_string();
    let target = req_parts
        .next()
        .ok_or_else(|| "missing path".to_string())?;
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (target.to_string(), String::new()),
    };

    Ok(HttpRequest {
        method,
        path,
        query,
    })
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn write_http_response(
    stream: &mut TcpStream,
    status: &str,
    content_type: &str,
    body: &[u8],
) -> Result<(), String> {
    let header = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    stream
        .write_all(header.as_bytes())
        .map_err(|e| e.to_string())?;
    stream.write_all(body).map_err(|e| e.to_string())
}

fn build_html(initial_payload_json: &str, server_mode: bool) -> String {
    let safe_json = initial_payload_json.replace("</script>", "<\\/script>");
    let server_mode_literal = if server_mode { "true" } else { "false" };

    let template = r##"<!doctype html>
<html lang="ko">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>storybook preview</title>
  <style>
    :root {
      --bg: #f2efe8;
      --panel: #fdfbf7;
      --ink: #252016;
      --muted: #675f50;
      --accent: #226a52;
      --line: #d7cebc;
      --turn-ms: 300ms;
    }
    * { box-sizing: border-box; }
    html, body { margin: 0; height: 100%; overflow: hidden; }
    body {
      color: var(--ink);
      background: var(--bg);
      font-family: "Noto Serif KR", "Source Serif 4", serif;
    }
    .book { position: relative; width: 100vw; height: 100vh; }
    .page {
      position: absolute;
      inset: 0;
      padding: 32px 24px 60px;
      background: var(--panel);
      overflow-y: auto;
      opacity: 0;
      visibility: hidden;
      transition: opacity var(--turn-ms) ease, transform var(--turn-ms) ease;
    }
    .page.active { opacity: 1; visibility: visible; transform: translateX(0); }
    .page.turning-forward { opacity: 0; transform: translateX(-12%); }
    .page.turning-backward { transform: translateX(0); }
    .page.cover, .page.back-cover {
      display: flex;
      flex-direction: column;
      align-items: center;
      justify-content: center;
      text-align: center;
    }
    .page h1 { font-size: 28px; margin: 0 0 12px; }
    .page h2 { font-size: 22px; margin: 0 0 16px; }
    .page p { font-size: 16px; line-height: 1.8; margin: 0 0 12px; }
    .page .cover-image { display: block; max-width: 100%; max-height: 220px; margin: 0 auto 16px; }
    .page .number {
      position: absolute;
      bottom: 16px;
      left: 0;
      right: 0;
      text-align: center;
      color: var(--muted);
      font-size: 13px;
    }
    .toc a {
      display: block;
      padding: 10px 0;
      border-bottom: 1px solid var(--line);
      color: var(--ink);
      text-decoration: none;
    }
    .toc a .author { color: var(--muted); font-size: 13px; margin-left: 8px; }
    .controls {
      position: fixed;
      bottom: 8px;
      right: 12px;
      display: flex;
      gap: 6px;
    }
    .controls button {
      border: 1px solid var(--line);
      background: var(--panel);
      color: var(--accent);
      padding: 4px 10px;
      border-radius: 4px;
    }
    .controls button:disabled { color: var(--line); }
    .indicator { align-self: center; color: var(--muted); font-size: 13px; }
  </style>
</head>
<body>
  <div class="book" id="book"></div>
  <div class="controls">
    <button id="prev" data-control="prev">&larr;</button>
    <button id="home" data-control="home">목차</button>
    <button id="next" data-control="next">&rarr;</button>
    <span class="indicator" id="indicator"></span>
  </div>
  <script>
    const SERVER_MODE = __SERVER_MODE__;
    const INITIAL = __DATA_JSON__;
    const book = document.getElementById("book");
    let state = null;
    let local = { index: 0 };
    let touchStart = null;

    function el(tag, cls, text) {
      const node = document.createElement(tag);
      if (cls) node.className = cls;
      if (text !== undefined) node.textContent = text;
      return node;
    }

    function coverUrl(id) {
      if (SERVER_MODE) return "/api/cover?id=" + encodeURIComponent(id);
      return INITIAL.covers[id] || null;
    }

    function renderPage(page, toc, titles) {
      const node = el("div", "page " + page.role);
      if (page.role === "cover") {
        node.appendChild(el("h1", "", "이야기 모음"));
        node.appendChild(el("p", "", "넘겨서 시작하세요"));
      } else if (page.role === "back-cover") {
        node.appendChild(el("h1", "", "끝"));
      } else if (page.role === "toc") {
        node.classList.add("toc");
        node.appendChild(el("h2", "", "목차"));
        for (const entry of toc) {
          const link = el("a", "", entry.title);
          link.href = "#story-" + entry.story_id;
          link.dataset.story = entry.story_id;
          link.appendChild(el("span", "author", entry.author));
          node.appendChild(link);
        }
      } else {
        if (page.chrome === "title-and-cover") {
          node.appendChild(el("h2", "", titles[page.story_id] || ""));
          const src = coverUrl(page.story_id);
          if (src) {
            const img = el("img", "cover-image");
            img.src = src;
            img.onerror = () => img.remove();
            node.appendChild(img);
          }
        }
        for (const text of page.paragraphs) node.appendChild(el("p", "", text));
        if (page.number) {
          node.appendChild(el("div", "number", "Page " + page.number.current + " / " + page.number.total));
        }
      }
      return node;
    }

    function paint(view) {
      book.replaceChildren();
      const shown = [];
      if (view.current) shown.push([view.current_index, view.current]);
      if (view.target) shown.push([view.target_index, view.target]);
      for (const [index, page] of shown) {
        const node = renderPage(page, view.toc, view.titles);
        const markers = view.markers[index] || [];
        if (markers.includes("active")) node.classList.add("active");
        if (markers.includes("turning-forward")) node.classList.add("turning-forward");
        if (markers.includes("turning-backward")) node.classList.add("turning-backward");
        book.appendChild(node);
      }
      document.getElementById("prev").disabled = !view.can_prev;
      document.getElementById("next").disabled = !view.can_next;
      document.getElementById("indicator").textContent =
        (view.current_index + 1) + " / " + view.total;
    }

    function fromServer(s) {
      state = s;
      const markers = {};
      for (const [index, set] of s.markers) markers[index] = set;
      paint({
        current_index: s.current_index,
        current: s.current_page,
        target_index: s.transition ? s.transition.to : null,
        target: s.target_page,
        markers,
        toc: s.toc,
        titles: s.titles,
        can_prev: s.can_prev,
        can_next: s.can_next,
        total: s.total_pages,
      });
      if (s.is_transitioning) {
        setTimeout(refresh, s.transition_ms + 20);
      }
    }

    async function refresh() {
      const res = await fetch("/api/state");
      if (res.ok) fromServer(await res.json());
    }

    async function send(params) {
      const res = await fetch("/api/input?" + new URLSearchParams(params).toString());
      if (res.ok) fromServer(await res.json());
    }

    function localGo(index) {
      const pages = INITIAL.pages;
      if (index < 0 || index >= pages.length) return;
      local.index = index;
      const markers = {};
      markers[index] = ["active"];
      paint({
        current_index: index,
        current: pages[index],
        target_index: null,
        target: null,
        markers,
        toc: INITIAL.toc,
        titles: INITIAL.titles,
        can_prev: index > 0,
        can_next: index < pages.length - 1,
        total: pages.length,
      });
    }

    function command(kind, params) {
      if (SERVER_MODE) {
        send(Object.assign({ kind }, params));
        return;
      }
      if (kind === "key") {
        if (params.key === "ArrowLeft") localGo(local.index - 1);
        if (params.key === "ArrowRight") localGo(local.index + 1);
        if (params.key === "Home") localGo(1);
      } else if (kind === "control") {
        if (params.control === "prev") localGo(local.index - 1);
        if (params.control === "next") localGo(local.index + 1);
        if (params.control === "home") localGo(1);
      } else if (kind === "toc") {
        const entry = INITIAL.toc.find((e) => String(e.story_id) === String(params.story));
        if (entry) localGo(entry.page_index);
      } else if (kind === "swipe") {
        localGo(local.index + params.delta);
      }
    }

    document.addEventListener("keydown", (ev) => {
      if (["ArrowLeft", "ArrowRight", "Home"].includes(ev.key)) {
        command("key", { key: ev.key });
      }
    });
    document.addEventListener("click", (ev) => {
      const link = ev.target.closest("a[data-story]");
      if (link) {
        ev.preventDefault();
        command("toc", { story: link.dataset.story });
        return;
      }
      const button = ev.target.closest("button[data-control]");
      if (button) command("control", { control: button.dataset.control });
    });
    document.addEventListener("touchstart", (ev) => {
      const t = ev.changedTouches[0];
      touchStart = { x: t.screenX, y: t.screenY };
      if (SERVER_MODE) send({ kind: "touch-start", x: t.screenX, y: t.screenY });
    }, { passive: true });
    document.addEventListener("touchend", (ev) => {
      const t = ev.changedTouches[0];
      if (SERVER_MODE) {
        send({ kind: "touch-end", x: t.screenX, y: t.screenY });
      } else if (touchStart) {
        const dx = t.screenX - touchStart.x;
        const dy = t.screenY - touchStart.y;
        if (Math.abs(dx) > Math.abs(dy) * 2 && Math.abs(dx) > 50) {
          command("swipe", { delta: dx < 0 ? 1 : -1 });
        }
      }
      touchStart = null;
    }, { passive: true });
    function sendResize() {
      return send({ kind: "resize", width: window.innerWidth, height: window.innerHeight })
        .then(() => setTimeout(refresh, (state ? state.resize_debounce_ms : 200) + 60));
    }
    window.addEventListener("resize", () => {
      if (SERVER_MODE) sendResize();
    });

    if (SERVER_MODE) {
      sendResize();
    } else {
      document.documentElement.style.setProperty("--turn-ms", INITIAL.transition_ms + "ms");
      localGo(0);
    }
  </script>
</body>
</html>
"##;

    template
        .replace("__SERVER_MODE__", server_mode_literal)
        .replace("__DATA_JSON__", &safe_json)
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        return Err("help requested".to_string());
    }

    let has_positional_dir = args.get(1).is_some_and(|v| !v.starts_with("--"));

    let mut cfg = Args {
        stories_dir: if has_positional_dir {
            args[1].clone()
        } else {
            DEFAULT_STORIES_DIR.to_string()
        },
        catalog_path: None,
        config_path: None,
        out_path: DEFAULT_OUT_PATH.to_string(),
        serve: false,
        compress_covers: false,
        max_width: covers::STORY_COVER_MAX_WIDTH,
        port: DEFAULT_PORT,
        width: None,
        height: None,
    };

    let mut i = if has_positional_dir { 2usize } else { 1usize };
    while i < args.len() {
        match args[i].as_str() {
            "--catalog" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--catalog requires a value".to_string())?;
                cfg.catalog_path = Some(v.clone());
                i += 2;
            }
            "--config" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                cfg.config_path = Some(v.clone());
                i += 2;
            }
            "--out" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--out requires a value".to_string())?;
                cfg.out_path = v.clone();
                i += 2;
            }
            "--serve" => {
                cfg.serve = true;
                i += 1;
            }
            "--compress-covers" => {
                cfg.compress_covers = true;
                i += 1;
            }
            "--max-width" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--max-width requires a value".to_string())?;
                cfg.max_width = v
                    .parse::<u32>()
                    .ok()
                    .filter(|w| *w > 0)
                    .ok_or_else(|| format!("invalid --max-width value '{}'", v))?;
                i += 2;
            }
            "--port" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--port requires a value".to_string())?;
                cfg.port = v
                    .parse::<u16>()
                    .map_err(|_| format!("invalid --port value '{}'", v))?;
                i += 2;
            }
            "--width" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--width requires a value".to_string())?;
                cfg.width = Some(
                    v.parse::<i32>()
                        .map_err(|_| format!("invalid --width value '{}'", v))?,
                );
                i += 2;
            }
            "--height" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--height requires a value".to_string())?;
                cfg.height = Some(
                    v.parse::<i32>()
                        .map_err(|_| format!("invalid --height value '{}'", v))?,
                );
                i += 2;
            }
            other => return Err(format!("unknown option '{}'", other)),
        }
    }

    if cfg.width.is_some_and(|w| w <= 0) || cfg.height.is_some_and(|h| h <= 0) {
        return Err("--width and --height must be > 0".to_string());
    }

    Ok(cfg)
}

fn help_text() -> &'static str {
    r#"web-preview - paginated story viewer preview for storybook

USAGE:
  cargo run -p storybook-render-web --bin web-preview -- [stories_dir] [options]

MODES:
  default: generate standalone HTML file at --out
  --serve: start local preview server driving the viewer state machine
  --compress-covers: downsize stories_dir/image/* into stories_dir/image/compressed/

OPTIONS:
  --catalog <file>   story metadata JSON array (default: discover stories_dir)
  --config <file>    viewer config JSON (default: built-in)
  --out <file>       output HTML path (default: target/web-preview/index.html)
  --serve            start local server mode
  --port <n>         server port in --serve mode (default: 42818)
  --width <px>       initial viewport width (default: 480)
  --height <px>      initial viewport height (default: 800)
  --max-width <px>   cover width for --compress-covers (default: 400; 800 for a book cover)

DEFAULT STORIES DIR:
  stories (falls back to the embedded catalog when absent)

Set RUST_LOG=debug for pagination and navigation traces.
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("web-preview")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parse_args_defaults() {
        let cli = parse_args(args(&[])).expect("defaults parse");
        assert_eq!(cli.stories_dir, DEFAULT_STORIES_DIR);
        assert_eq!(cli.out_path, DEFAULT_OUT_PATH);
        assert!(!cli.serve);
        assert_eq!(cli.width, None);
    }

    #[test]
    fn parse_args_positional_dir_and_options() {
        let cli = parse_args(args(&[
            "my-stories",
            "--serve",
            "--port",
            "9000",
            "--width",
            "320",
            "--catalog",
            "c.json",
        ]))
        .expect("options parse");
        assert_eq!(cli.stories_dir, "my-stories");
        assert!(cli.serve);
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.width, Some(320));
        assert_eq!(cli.catalog_path.as_deref(), Some("c.json"));
    }

    #[test]
    fn parse_args_rejects_bad_values() {
        assert!(parse_args(args(&["--port", "x"])).is_err());
        assert!(parse_args(args(&["--height", "0"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
        assert!(parse_args(args(&["--out"])).is_err());
    }

    #[test]
    fn header_end_detection() {
        assert_eq!(find_header_end(b"GET / HTTP/1.1\r\n\r\n"), Some(14));
        assert_eq!(find_header_end(b"GET /"), None);
    }

    #[test]
    fn html_escapes_script_close() {
        let html = build_html(r#"{"x":"</script>"}"#, false);
        assert!(html.contains(r#"{"x":"<\/script>"}"#));
        assert!(html.contains("const SERVER_MODE = false;"));
    }

    #[test]
    fn cover_paths_cannot_escape_dir() {
        assert_eq!(read_cover(Path::new("."), "../secret.png"), None);
        assert_eq!(read_cover(Path::new("."), ""), None);
        assert_eq!(read_cover(Path::new("."), "/etc/passwd"), None);
        assert_eq!(read_cover(Path::new("."), "image/../../x.png"), None);
    }

    #[test]
    fn parse_args_compress_mode() {
        let cli = parse_args(args(&["covers-dir", "--compress-covers", "--max-width", "800"]))
            .expect("compress args");
        assert!(cli.compress_covers);
        assert_eq!(cli.max_width, 800);
        assert_eq!(cli.stories_dir, "covers-dir");
        assert_eq!(
            parse_args(args(&[])).expect("defaults").max_width,
            covers::STORY_COVER_MAX_WIDTH
        );
        assert!(parse_args(args(&["--max-width", "0"])).is_err());
    }

    #[test]
    fn state_payload_carries_debounce() {
        let viewer = storybook_render::Viewer::with_heuristic_oracle(
            ViewerConfig {
                resize_debounce_ms: 750,
                ..ViewerConfig::default()
            },
            Vec::new(),
        );
        let titles = BTreeMap::new();
        let payload = StatePayload {
            snapshot: viewer.snapshot(),
            transition_ms: viewer.config().transition_ms,
            resize_debounce_ms: viewer.config().resize_debounce_ms,
            titles: &titles,
        };
        let json = serde_json::to_value(&payload).expect("payload json");
        assert_eq!(json["resize_debounce_ms"], 750);
        assert!(build_html("null", true).contains("state.resize_debounce_ms"));
    }
}
