/// Remote control page served at `/`.
///
/// Each button toggles between `/doorN/on` and `/doorN/off`.
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
  <meta charset="utf-8">
  <title>Controle de Portas</title>
</head>
<body>
  <h1>Controle Remoto</h1>
  <button onclick="control(event, 1)">Abrir Porta 1</button>
  <button onclick="control(event, 2)">Abrir Porta 2</button>
  <script>
    function control(event, door) {
      const button = event.target;
      const action = button.innerHTML.includes("Abrir") ? "on" : "off";

      fetch(`/door${door}/${action}`)
        .then(response => {
          if (!response.ok) {
            throw new Error(response.statusText);
          }
          button.innerHTML = action === "on"
            ? `Fechar Porta ${door}`
            : `Abrir Porta ${door}`;
        })
        .catch(error => console.log("Erro:", error));
    }
  </script>
</body>
</html>
"#;
