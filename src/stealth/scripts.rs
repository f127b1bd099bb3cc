//! Inline evasion scripts, injected in order before any page script runs
//!
//! Each script reads its values from `window.__stealthProfile`, which is
//! injected first.

pub(super) const NAVIGATOR_WEBDRIVER: &str = r"
(() => {
  const proto = Object.getPrototypeOf(navigator);
  if ('webdriver' in proto) {
    delete proto.webdriver;
  }
  Object.defineProperty(proto, 'webdriver', { get: () => undefined, configurable: true });
})();
";

pub(super) const CDP_MARKERS: &str = r"
(() => {
  for (const key of Object.keys(window)) {
    if (/^cdc_|^\$cdc_|^__webdriver|^__selenium|^__driver/.test(key)) {
      try { delete window[key]; } catch (_) {}
    }
  }
})();
";

pub(super) const NAVIGATOR_LANGUAGES: &str = r"
(() => {
  const p = window.__stealthProfile;
  const proto = Object.getPrototypeOf(navigator);
  Object.defineProperty(proto, 'language', { get: () => p.language, configurable: true });
  Object.defineProperty(proto, 'languages', { get: () => Object.freeze([...p.languages]), configurable: true });
  Object.defineProperty(proto, 'platform', { get: () => p.platform, configurable: true });
  Object.defineProperty(proto, 'vendor', { get: () => 'Google Inc.', configurable: true });
  Object.defineProperty(proto, 'hardwareConcurrency', { get: () => p.hardwareConcurrency, configurable: true });
})();
";

pub(super) const NAVIGATOR_PLUGINS: &str = r"
(() => {
  const names = ['PDF Viewer', 'Chrome PDF Viewer', 'Chromium PDF Viewer', 'Microsoft Edge PDF Viewer', 'WebKit built-in PDF'];
  const plugins = names.map((name) => ({
    name,
    filename: 'internal-pdf-viewer',
    description: 'Portable Document Format',
    length: 1,
  }));
  const list = Object.create(PluginArray.prototype);
  plugins.forEach((plugin, i) => { list[i] = plugin; });
  Object.defineProperty(list, 'length', { get: () => plugins.length });
  list.item = (i) => plugins[i] || null;
  list.namedItem = (name) => plugins.find((plugin) => plugin.name === name) || null;
  list.refresh = () => {};
  Object.defineProperty(Object.getPrototypeOf(navigator), 'plugins', { get: () => list, configurable: true });
})();
";

pub(super) const PERMISSIONS: &str = r"
(() => {
  const original = window.navigator.permissions && window.navigator.permissions.query;
  if (!original) return;
  window.navigator.permissions.query = (parameters) =>
    parameters && parameters.name === 'notifications'
      ? Promise.resolve({ state: Notification.permission, onchange: null })
      : original.call(window.navigator.permissions, parameters);
})();
";

pub(super) const WEBGL_VENDOR: &str = r"
(() => {
  const p = window.__stealthProfile;
  const patch = (ctor) => {
    if (!ctor) return;
    const getParameter = ctor.prototype.getParameter;
    ctor.prototype.getParameter = function (param) {
      if (param === 37445) return p.webglVendor;
      if (param === 37446) return p.webglRenderer;
      return getParameter.call(this, param);
    };
  };
  patch(window.WebGLRenderingContext);
  patch(window.WebGL2RenderingContext);
})();
";

pub(super) const CHROME_RUNTIME: &str = r"
(() => {
  if (!window.chrome) {
    Object.defineProperty(window, 'chrome', { value: {}, writable: true, configurable: true });
  }
  if (!window.chrome.runtime) {
    window.chrome.runtime = {
      OnInstalledReason: { INSTALL: 'install', UPDATE: 'update' },
      PlatformOs: { WIN: 'win', MAC: 'mac', LINUX: 'linux' },
      connect: () => ({ onMessage: { addListener() {} }, postMessage() {}, disconnect() {} }),
      sendMessage: () => {},
    };
  }
  if (!window.chrome.app) {
    window.chrome.app = { isInstalled: false, getDetails: () => null, getIsInstalled: () => false };
  }
})();
";

pub(super) const SCREEN: &str = r"
(() => {
  const p = window.__stealthProfile;
  Object.defineProperty(screen, 'width', { get: () => p.screenWidth });
  Object.defineProperty(screen, 'height', { get: () => p.screenHeight });
  Object.defineProperty(screen, 'availWidth', { get: () => p.screenWidth });
  Object.defineProperty(screen, 'availHeight', { get: () => p.screenHeight - 40 });
  Object.defineProperty(window, 'outerWidth', { get: () => p.screenWidth });
  Object.defineProperty(window, 'outerHeight', { get: () => p.screenHeight });
})();
";

// Registered after the profile script; each only reads `window.__stealthProfile`.
pub(super) const EVASION_SCRIPTS: &[(&str, &str)] = &[
    ("cdp_markers", CDP_MARKERS),
    ("navigator_webdriver", NAVIGATOR_WEBDRIVER),
    ("navigator_languages", NAVIGATOR_LANGUAGES),
    ("navigator_plugins", NAVIGATOR_PLUGINS),
    ("permissions", PERMISSIONS),
    ("webgl_vendor", WEBGL_VENDOR),
    ("chrome_runtime", CHROME_RUNTIME),
    ("screen", SCREEN),
];
