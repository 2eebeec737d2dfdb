//! Wallet page HTML
//!
//! Self-contained HTML/JS page that waits for the Keplr-compatible extension,
//! runs one request against it and posts the answer back.

/// How long the page waits for the extension to inject itself (milliseconds)
const EXTENSION_READY_TIMEOUT_MS: u64 = 3_000;

/// Generate the wallet page HTML
///
/// The page will:
/// 1. Wait for `window.keplr` (document ready or a bounded timeout)
/// 2. Fetch the request from /wallet/{id}/request
/// 3. Connect: suggest the chain if asked, enable it, read the key
/// 4. SignAmino / SignDirect: ask the extension to sign
/// 5. POST the result (or the failure) to /wallet/{id}/callback
pub fn generate_page(request_id: &str, title: &str, host: &str, port: u16) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - terpdash</title>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #0b0f0c;
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            color: #fff;
        }}
        .container {{
            background: rgba(255,255,255,0.05);
            border-radius: 16px;
            padding: 40px;
            max-width: 480px;
            width: 90%;
            text-align: center;
            border: 1px solid rgba(255,255,255,0.1);
        }}
        h1 {{ font-size: 24px; margin-bottom: 24px; }}
        .status {{ padding: 20px; border-radius: 8px; font-size: 16px; }}
        .status.loading {{ background: rgba(59, 130, 246, 0.2); }}
        .status.success {{ background: rgba(34, 197, 94, 0.2); }}
        .status.error {{ background: rgba(239, 68, 68, 0.2); }}
        .detail {{
            font-family: monospace; font-size: 11px;
            margin-top: 12px; word-break: break-all;
        }}
        .hidden {{ display: none; }}
        a {{ color: #3b82f6; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>{title}</h1>
        <div id="status" class="status loading">Waiting for wallet extension...</div>
        <div id="detail" class="detail hidden"></div>
        <div id="install" class="hidden">
            <br>
            <a href="https://www.keplr.app/download" target="_blank">Install Keplr</a>
        </div>
    </div>
    <script>
        const REQUEST_ID = "{request_id}";
        const BASE_URL = "http://{host}:{port}";
        const READY_TIMEOUT_MS = {ready_timeout};

        const statusEl = document.getElementById('status');
        const detailEl = document.getElementById('detail');

        function setStatus(text, type) {{
            statusEl.textContent = text;
            statusEl.className = 'status ' + type;
        }}

        function showDetail(text) {{
            detailEl.textContent = text;
            detailEl.classList.remove('hidden');
        }}

        function toBase64(bytes) {{
            let bin = '';
            for (let i = 0; i < bytes.length; i++) bin += String.fromCharCode(bytes[i]);
            return btoa(bin);
        }}

        function fromBase64(text) {{
            const bin = atob(text);
            const out = new Uint8Array(bin.length);
            for (let i = 0; i < bin.length; i++) out[i] = bin.charCodeAt(i);
            return out;
        }}

        // Resolve as soon as the extension is injected, or give up after the timeout.
        function waitForExtension() {{
            if (window.keplr) return Promise.resolve(window.keplr);
            return new Promise(resolve => {{
                const finish = () => {{
                    clearTimeout(timer);
                    document.removeEventListener('readystatechange', onChange);
                    resolve(window.keplr || null);
                }};
                const onChange = () => {{
                    if (document.readyState === 'complete') finish();
                }};
                const timer = setTimeout(finish, READY_TIMEOUT_MS);
                document.addEventListener('readystatechange', onChange);
            }});
        }}

        async function reply(body) {{
            await fetch(BASE_URL + '/wallet/' + REQUEST_ID + '/callback', {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify(body)
            }});
        }}

        async function connect(keplr, req) {{
            if (req.suggest) {{
                setStatus('Please approve adding ' + req.chain_id + ' to your wallet...', 'loading');
                await keplr.experimentalSuggestChain(req.suggest);
            }}
            setStatus('Please approve the connection in your wallet...', 'loading');
            await keplr.enable(req.chain_id);
            const key = await keplr.getKey(req.chain_id);
            return {{
                chain_id: req.chain_id,
                address: key.bech32Address,
                pub_key: toBase64(key.pubKey),
                name: key.name || '',
                algo: key.algo || ''
            }};
        }}

        async function signAmino(keplr, req) {{
            setStatus('Please approve the transaction in your wallet...', 'loading');
            return await keplr.signAmino(req.chain_id, req.signer, req.sign_doc);
        }}

        async function signDirect(keplr, req) {{
            setStatus('Please approve the transaction in your wallet...', 'loading');
            const doc = {{
                bodyBytes: fromBase64(req.body_bytes),
                authInfoBytes: fromBase64(req.auth_info_bytes),
                chainId: req.chain_id,
                accountNumber: req.account_number
            }};
            const res = await keplr.signDirect(req.chain_id, req.signer, doc, {{ isEthereum: req.is_ethereum }});
            return {{
                signed: {{
                    body_bytes: toBase64(res.signed.bodyBytes),
                    auth_info_bytes: toBase64(res.signed.authInfoBytes),
                    chain_id: res.signed.chainId,
                    account_number: String(res.signed.accountNumber)
                }},
                signature: res.signature
            }};
        }}

        async function run() {{
            const keplr = await waitForExtension();
            if (!keplr) {{
                setStatus('Wallet extension not detected', 'error');
                document.getElementById('install').classList.remove('hidden');
                await reply({{ ok: false, extension_missing: true }});
                return;
            }}

            let req;
            try {{
                const resp = await fetch(BASE_URL + '/wallet/' + REQUEST_ID + '/request');
                if (!resp.ok) {{
                    setStatus('Request is no longer available', 'error');
                    return;
                }}
                req = await resp.json();
            }} catch (error) {{
                setStatus('Could not reach terpdash', 'error');
                return;
            }}

            try {{
                let result;
                if (req.kind === 'connect') result = await connect(keplr, req);
                else if (req.kind === 'sign_amino') result = await signAmino(keplr, req);
                else if (req.kind === 'sign_direct') result = await signDirect(keplr, req);
                else throw new Error('Unknown request kind ' + req.kind);

                await reply({{ ok: true, result: result }});
                setStatus('Done. You can close this window.', 'success');
                if (result.address) showDetail(result.address);
                setTimeout(() => {{
                    try {{ window.close(); }} catch(e) {{}}
                }}, 2000);
            }} catch (error) {{
                console.error('Wallet error:', error);
                const message = (error && error.message) || String(error);
                await reply({{ ok: false, error: message }});
                setStatus('Error: ' + message, 'error');
            }}
        }}

        run();
    </script>
</body>
</html>"#,
        title = escape_html(title),
        request_id = escape_js_string(request_id),
        host = host,
        port = port,
        ready_timeout = EXTENSION_READY_TIMEOUT_MS,
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Escape string for safe use in JavaScript
fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_embeds_request() {
        let html = generate_page("abc123", "Sign Transaction", "127.0.0.1", 4100);
        assert!(html.contains(r#"const REQUEST_ID = "abc123";"#));
        assert!(html.contains("http://127.0.0.1:4100"));
        assert!(html.contains("READY_TIMEOUT_MS = 3000"));
        assert!(html.contains("isEthereum: req.is_ethereum"));
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_js_string("a\"b</script>"), "a\\\"b\\u003c/script\\u003e");
        assert_eq!(escape_html("<b>"), "&lt;b&gt;");
    }
}
