use quick_xml::escape::escape;

enum Node {
    Text(String),
    Element(Command),
}

/// Builder for a GMP XML command. All text and attribute values are escaped.
pub struct Command {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Command {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.attrs.push((key.to_string(), value.as_ref().to_string()));
        self
    }

    pub fn text(mut self, text: impl AsRef<str>) -> Self {
        self.children.push(Node::Text(text.as_ref().to_string()));
        self
    }

    pub fn child(mut self, child: Command) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Appends `<name>text</name>`.
    pub fn field(self, name: &str, text: impl AsRef<str>) -> Self {
        self.child(Command::new(name).text(text))
    }

    pub fn field_opt(self, name: &str, text: Option<&str>) -> Self {
        match text {
            Some(t) => self.field(name, t),
            None => self,
        }
    }

    /// Appends `<name id="..."/>`, the GMP form for referencing another resource.
    pub fn reference(self, name: &str, id: &str) -> Self {
        self.child(Command::new(name).attr("id", id))
    }

    pub fn reference_opt(self, name: &str, id: Option<&str>) -> Self {
        match id {
            Some(id) => self.reference(name, id),
            None => self,
        }
    }

    pub fn build(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(&escape(text.as_str())),
                Node::Element(cmd) => cmd.write(out),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command() {
        let cmd = Command::new("get_tasks").attr("filter", "rows=-1");
        assert_eq!(cmd.build(), "<get_tasks filter=\"rows=-1\"/>");
    }

    #[test]
    fn test_nested_fields() {
        let cmd = Command::new("create_target")
            .field("name", "web")
            .field("hosts", "10.0.0.1,10.0.0.2")
            .reference("port_list", "pl-1")
            .field_opt("comment", None);
        assert_eq!(
            cmd.build(),
            "<create_target><name>web</name><hosts>10.0.0.1,10.0.0.2</hosts><port_list id=\"pl-1\"/></create_target>"
        );
    }

    #[test]
    fn test_escapes_user_text() {
        let cmd = Command::new("create_target")
            .attr("comment", "a\"b")
            .field("name", "<script>&</script>");
        let xml = cmd.build();
        assert!(xml.contains("&lt;script&gt;&amp;&lt;/script&gt;"));
        assert!(xml.contains("comment=\"a&quot;b\""));
    }

    #[test]
    fn test_mixed_content() {
        let cmd = Command::new("condition")
            .text("Always")
            .child(Command::new("data").text("v").field("name", "k"));
        assert_eq!(cmd.build(), "<condition>Always<data>v<name>k</name></data></condition>");
    }
}
