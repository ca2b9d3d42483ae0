use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};

pub async fn index_page() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html")],
        r#"<!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <meta name="viewport" content="width=device-width, initial-scale=1.0">
            <title>visionkit</title>
            <style>
                * { margin: 0; padding: 0; box-sizing: border-box; }

                body {
                    background: #fff;
                    color: #000;
                    font-family: monospace;
                    height: 100vh;
                    overflow: hidden;
                }

                .wrapper { height: 100vh; display: flex; flex-direction: column; }

                .header-bar {
                    padding: 15px 20px;
                    border-bottom: 2px solid #000;
                    display: flex;
                    justify-content: space-between;
                    align-items: center;
                }

                .brand { font-weight: 700; font-size: 1.2rem; letter-spacing: -1px; }

                .keys button, .save-btn {
                    background: #000;
                    color: #fff;
                    border: none;
                    padding: 8px 12px;
                    font-family: monospace;
                    cursor: pointer;
                }

                .main { flex: 1; display: grid; grid-template-columns: 300px 1fr; }

                .sidebar { border-right: 2px solid #000; padding: 20px; overflow-y: auto; }

                .section-head {
                    font-size: 0.7rem;
                    font-weight: 700;
                    text-transform: uppercase;
                    margin: 15px 0 10px;
                    padding-bottom: 8px;
                    border-bottom: 1px solid #000;
                }

                .field-group { display: grid; grid-template-columns: 1fr 1fr 1fr; gap: 8px; margin-bottom: 8px; }

                .field input { border: 1px solid #000; padding: 6px; width: 100%; font-family: monospace; }

                .field-label { font-size: 0.65rem; text-transform: uppercase; }

                .save-btn { width: 100%; margin-top: 15px; }

                .content-area {
                    display: grid;
                    grid-template-columns: repeat(auto-fit, minmax(320px, 1fr));
                    gap: 2px;
                    background: #000;
                    padding: 2px;
                }

                .feed { background: #fff; position: relative; display: flex; align-items: center; justify-content: center; }

                .feed-title {
                    position: absolute;
                    top: 10px;
                    left: 10px;
                    font-size: 0.65rem;
                    font-weight: 700;
                    background: #fff;
                    padding: 4px 8px;
                    border: 1px solid #000;
                }

                .feed img { width: 100%; height: 100%; object-fit: contain; }
            </style>
        </head>
        <body>
            <div class="wrapper">
                <div class="header-bar">
                    <div class="brand">VISIONKIT</div>
                    <div class="keys">
                        <input id="key_input" maxlength="1" size="2">
                        <button id="key_btn">SEND KEY</button>
                        <button id="quit_btn">QUIT (q)</button>
                    </div>
                </div>

                <div class="main">
                    <div class="sidebar">
                        <div class="section-head">HSV Lower</div>
                        <div class="field-group">
                            <div class="field"><div class="field-label">H</div><input type="number" id="h_low"></div>
                            <div class="field"><div class="field-label">S</div><input type="number" id="s_low"></div>
                            <div class="field"><div class="field-label">V</div><input type="number" id="v_low"></div>
                        </div>
                        <div class="section-head">HSV Upper</div>
                        <div class="field-group">
                            <div class="field"><div class="field-label">H</div><input type="number" id="h_high"></div>
                            <div class="field"><div class="field-label">S</div><input type="number" id="s_high"></div>
                            <div class="field"><div class="field-label">V</div><input type="number" id="v_high"></div>
                        </div>
                        <div class="section-head">Target (BGR)</div>
                        <div class="field-group">
                            <div class="field"><div class="field-label">B</div><input type="number" id="t_b"></div>
                            <div class="field"><div class="field-label">G</div><input type="number" id="t_g"></div>
                            <div class="field"><div class="field-label">R</div><input type="number" id="t_r"></div>
                        </div>
                        <div class="section-head">Objects</div>
                        <div class="field-group">
                            <div class="field"><div class="field-label">Area</div><input type="number" id="min_area"></div>
                            <div class="field"><div class="field-label">Thresh</div><input type="number" id="threshold"></div>
                            <div class="field"><div class="field-label">Contour</div><input type="number" id="contour_threshold"></div>
                        </div>
                        <button id="save_btn" class="save-btn">SAVE</button>
                    </div>

                    <div class="content-area" id="feeds"></div>
                </div>
            </div>

            <script>
                const val = (id) => parseFloat(document.getElementById(id).value) || 0;
                const set = (id, v) => { document.getElementById(id).value = v; };
                const shown = new Set();

                async function loadWindows() {
                    try {
                        const res = await fetch('/windows');
                        const names = await res.json();
                        const feeds = document.getElementById('feeds');
                        for (const name of names) {
                            if (shown.has(name)) continue;
                            shown.add(name);
                            const feed = document.createElement('div');
                            feed.className = 'feed';
                            const title = document.createElement('div');
                            title.className = 'feed-title';
                            title.textContent = name;
                            const img = document.createElement('img');
                            img.src = '/stream/' + encodeURIComponent(name);
                            img.alt = name;
                            feed.append(title, img);
                            feeds.append(feed);
                        }
                    } catch (e) { console.error("Window list error", e); }
                }

                async function sendKey(key) {
                    if (!key) return;
                    await fetch('/key/' + encodeURIComponent(key), { method: 'POST' });
                }

                async function loadConfig() {
                    try {
                        const res = await fetch('/config');
                        const cfg = await res.json();
                        ['h_low', 's_low', 'v_low'].forEach((id, i) => set(id, cfg.color_lower[i]));
                        ['h_high', 's_high', 'v_high'].forEach((id, i) => set(id, cfg.color_upper[i]));
                        ['t_b', 't_g', 't_r'].forEach((id, i) => set(id, cfg.target_bgr[i]));
                        set('min_area', cfg.min_area);
                        set('threshold', cfg.threshold);
                        set('contour_threshold', cfg.contour_threshold);
                    } catch (e) { console.error("Config load error", e); }
                }

                async function updateConfig() {
                    const data = {
                        color_lower: [val('h_low'), val('s_low'), val('v_low')],
                        color_upper: [val('h_high'), val('s_high'), val('v_high')],
                        target_bgr: [val('t_b'), val('t_g'), val('t_r')],
                        min_area: val('min_area'),
                        threshold: Math.floor(val('threshold')),
                        contour_threshold: Math.floor(val('contour_threshold'))
                    };
                    try {
                        await fetch('/config', {
                            method: 'POST',
                            headers: { 'Content-Type': 'application/json' },
                            body: JSON.stringify(data)
                        });
                    } catch (e) {
                        alert("Failed to save");
                    }
                }

                document.getElementById('save_btn').addEventListener('click', updateConfig);
                document.getElementById('quit_btn').addEventListener('click', () => sendKey('q'));
                document.getElementById('key_btn').addEventListener('click', () => sendKey(document.getElementById('key_input').value));
                loadConfig();
                loadWindows();
                setInterval(loadWindows, 2000);
            </script>
        </body>
        </html>
"#,
    )
}
