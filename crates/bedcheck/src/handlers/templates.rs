//! html templates for the resident-facing pages.
//!
//! consolidated here to avoid inline html in handlers. plain `format!`
//! templates; the pages are small enough that a template engine would
//! be more machinery than markup.

use chrono::FixedOffset;

use bedcheck_types::{CheckinRecord, CheckinStatus, Resident};

/// the resident check-in page.
///
/// with a resolved identity the page greets the resident, shows
/// tonight's status, and wires the gps check-in button; without one it
/// asks for the personal link instead of offering a form.
pub fn checkin_page(
    resident: Option<&Resident>,
    today: Option<&CheckinRecord>,
    offset: FixedOffset,
) -> String {
    let body = match resident {
        Some(resident) => {
            let status_block = match today {
                Some(record) => {
                    let time = record
                        .recorded_at
                        .with_timezone(&offset)
                        .format("%H:%M:%S");
                    let how = match record.status {
                        CheckinStatus::Manual => "（由宿舍老師登記）",
                        CheckinStatus::Success => "",
                    };
                    format!(
                        r#"<div class="status done">✅ 今晚已完成點名：{time} {how}</div>"#
                    )
                }
                None => r#"<div class="status pending">🌙 今晚尚未點名</div>"#.to_string(),
            };
            format!(
                r#"<h1>宿舍晚點名</h1>
    <div class="card">
        <p class="who">{name}（{room} 室）</p>
        {status_block}
        <button id="checkin-btn" onclick="doCheckin()">📍 我在宿舍，點名！</button>
        <p id="result"></p>
    </div>
    <script>
    function doCheckin() {{
        const btn = document.getElementById('checkin-btn');
        const result = document.getElementById('result');
        btn.disabled = true;
        result.textContent = '正在取得 GPS 位置…';
        navigator.geolocation.getCurrentPosition(async (pos) => {{
            const body = new URLSearchParams();
            body.set('lat', pos.coords.latitude);
            body.set('lng', pos.coords.longitude);
            const resp = await fetch('/checkin' + window.location.search, {{
                method: 'POST',
                headers: {{'Content-Type': 'application/x-www-form-urlencoded'}},
                body: body,
            }});
            const data = await resp.json();
            result.textContent = data.message;
            if (data.code === 'ACCEPTED') {{
                setTimeout(() => window.location.reload(), 1200);
            }} else {{
                btn.disabled = false;
            }}
        }}, () => {{
            result.textContent = '無法抓取位置資訊，請確認手機 GPS 已開啟並允許瀏覽器讀取位置。';
            btn.disabled = false;
        }}, {{ enableHighAccuracy: true, timeout: 10000 }});
    }}
    </script>"#,
                name = resident.name,
                room = resident.room,
            )
        }
        None => r#"<h1>宿舍晚點名</h1>
    <div class="card">
        <p>無法辨識您的身分。</p>
        <p>請使用宿舍發給您的<strong>專屬連結</strong>開啟本頁面，或洽宿舍老師重新取得連結。</p>
    </div>"#
            .to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-Hant">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>宿舍晚點名</title>
    <link rel="manifest" href="/manifest.json">
    <style>
        body {{ font-family: system-ui, -apple-system, sans-serif; max-width: 480px; margin: 40px auto; padding: 0 20px; background: #f0f2f5; }}
        h1 {{ text-align: center; color: #333; }}
        .card {{ background: white; padding: 24px; border-radius: 15px; box-shadow: 0 4px 15px rgba(0,0,0,0.1); }}
        .who {{ font-size: 18px; font-weight: bold; }}
        .status {{ padding: 12px; border-radius: 8px; margin: 16px 0; }}
        .status.done {{ background: #e6f7e6; color: #1a7f1a; }}
        .status.pending {{ background: #fff4e5; color: #8a5a00; }}
        button {{ display: block; width: 100%; padding: 15px; background: #007aff; color: white; border: none; border-radius: 10px; font-size: 16px; font-weight: bold; }}
        button:disabled {{ background: #9bc4f5; }}
    </style>
</head>
<body>
    {body}
</body>
</html>"#
    )
}

/// the pwa manifest, so android phones can pin the page.
pub const MANIFEST_JSON: &str = r##"{
  "name": "宿舍晚點名",
  "short_name": "晚點名",
  "start_url": ".",
  "display": "standalone",
  "background_color": "#ffffff",
  "theme_color": "#007aff",
  "icons": [
    {
      "src": "https://cdn-icons-png.flaticon.com/512/1946/1946488.png",
      "sizes": "192x192",
      "type": "image/png"
    }
  ]
}"##;
